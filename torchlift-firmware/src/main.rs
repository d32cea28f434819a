//! Torchlift - Plasma Torch Height Control Firmware
//!
//! Main firmware binary for RP2040-based torch height control boards.
//! Samples the arc voltage divider, jogs the Z axis to keep it inside the
//! hysteresis band and latches fault lines into a feed hold.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_rp::adc::{Adc, Channel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::flash::{Blocking, Flash};
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_rp::peripherals::{FLASH, UART0};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_rp::Peri;
use embassy_time::Delay;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use torchlift_core::config::{FaultConfig, ThcConfig};
use torchlift_core::motion::TickDriver;
use torchlift_core::safety::FaultPort;
use torchlift_core::sampler::Sampler;
use torchlift_drivers::sensor::LatchedConverter;
use torchlift_drivers::stepper::{GpioStepAxis, StepTiming};

use crate::board::{FaultInputs, GpioBank, RpAdcSource, RpOutput};
use crate::channels::{FAULTS, THC};

mod board;
mod channels;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

/// Flash size of the reference board
const FLASH_SIZE: usize = 2 * 1024 * 1024;

/// Stored configuration lives in the last flash sector
const CONFIG_OFFSET: u32 = (FLASH_SIZE - 4096) as u32;

/// Largest encoded configuration
const CONFIG_MAX_LEN: usize = 64;

/// Converter channel wired to the arc voltage divider
const ARC_ADC_CHANNEL: u8 = 3;

/// Realtime tasks preempt the console
static EXECUTOR_HIGH: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EXECUTOR_HIGH.on_interrupt()
}

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Torchlift firmware starting...");

    // Initialize RP2040 peripherals
    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config(p.FLASH);

    // Shared state starts from the loaded boot values
    THC.set_setpoint(config.setpoint);
    THC.set_engaged(config.engaged);
    FAULTS.install(config.faults);
    info!(
        "THC: target={} hysteresis={} engaged={}",
        config.setpoint.target, config.setpoint.hysteresis, config.engaged
    );

    // Setup UART for the command console
    let uart_config = UartConfig::default(); // 115200 baud default

    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);

    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);

    info!("UART initialized for command console");

    // Setup step/dir output (GPIO2 = STEP, GPIO3 = DIR)
    let axis = GpioStepAxis::new(
        config.tick.axis,
        RpOutput(Output::new(p.PIN_2, Level::Low)),
        RpOutput(Output::new(p.PIN_3, Level::Low)),
        Delay,
        StepTiming::from(&config.tick),
    );
    let driver = TickDriver::new(axis, config.tick);

    info!(
        "Step output on {:?}, control every {} us",
        config.tick.axis,
        config.tick.control_interval_us()
    );

    // Setup ADC for the arc voltage divider (GPIO29 = ADC3)
    if config.adc_channel != ARC_ADC_CHANNEL {
        warn!(
            "ADC channel {} is not wired, using channel {}",
            config.adc_channel, ARC_ADC_CHANNEL
        );
    }
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let arc_channel = Channel::new_pin(p.PIN_29, Pull::None);
    let sampler = Sampler::new(LatchedConverter::new(RpAdcSource::new(adc, arc_channel)));

    // Fault lines are active low with pull-ups
    let mut faults = FaultInputs::new(config.faults);
    faults.attach(FaultPort::B, 0, Input::new(p.PIN_4, Pull::Up));
    faults.attach(FaultPort::B, 1, Input::new(p.PIN_5, Pull::Up));
    faults.attach(FaultPort::B, 2, Input::new(p.PIN_6, Pull::Up));
    faults.attach(FaultPort::B, 3, Input::new(p.PIN_7, Pull::Up));
    faults.attach(FaultPort::J, 0, Input::new(p.PIN_8, Pull::Up));
    faults.attach(FaultPort::J, 1, Input::new(p.PIN_9, Pull::Up));
    faults.attach(FaultPort::J, 2, Input::new(p.PIN_10, Pull::Up));
    faults.attach(FaultPort::J, 3, Input::new(p.PIN_11, Pull::Up));
    faults.attach(FaultPort::K, 0, Input::new(p.PIN_12, Pull::Up));
    faults.attach(FaultPort::K, 1, Input::new(p.PIN_13, Pull::Up));
    faults.attach(FaultPort::K, 2, Input::new(p.PIN_14, Pull::Up));
    faults.attach(FaultPort::K, 3, Input::new(p.PIN_15, Pull::Up));

    for port in FaultPort::SCAN_ORDER {
        let unwired = faults.unwired(port);
        if unwired != 0 {
            warn!("Fault port {} lines {=u8:#b} are not wired", port, unwired);
        }
    }

    // General-purpose pins by connector number
    let pins = GpioBank::new([
        (41, Flex::new(p.PIN_25)),
        (42, Flex::new(p.PIN_26)),
        (43, Flex::new(p.PIN_27)),
        (30, Flex::new(p.PIN_28)),
    ]);

    // Realtime tasks on the interrupt executor
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let realtime = EXECUTOR_HIGH.start(interrupt::SWI_IRQ_1);

    info!("Spawning tasks...");

    realtime
        .spawn(tasks::tick_task(driver, config.tick.tick_period_us))
        .unwrap();
    realtime
        .spawn(tasks::sampler_task(sampler, config.tick.tick_period_us))
        .unwrap();
    realtime.spawn(tasks::fault_task(faults)).unwrap();
    spawner.spawn(tasks::console_task(uart, pins)).unwrap();

    info!("All tasks spawned, system running");
}

/// Load the stored configuration, or the board defaults
fn load_config(flash: Peri<'static, FLASH>) -> ThcConfig {
    let mut flash = Flash::<_, Blocking, FLASH_SIZE>::new_blocking(flash);
    let mut buf = [0u8; CONFIG_MAX_LEN];

    if let Err(e) = flash.blocking_read(CONFIG_OFFSET, &mut buf) {
        warn!("Flash read failed: {:?}", e);
        return board_defaults();
    }

    match ThcConfig::from_bytes(&buf) {
        Ok(config) => {
            info!("Loaded configuration from flash");
            config
        }
        Err(e) => {
            // Erased sector or stale layout
            info!("No valid configuration in flash ({:?}), using defaults", e);
            board_defaults()
        }
    }
}

/// Boot values with the reference board's fault wiring
///
/// Port K lines 0-3 (GPIO12-15) are the torch breakaway and arc fault
/// inputs, idle high.
fn board_defaults() -> ThcConfig {
    ThcConfig {
        faults: FaultConfig::none().with_port(FaultPort::K, 0x0F, 0x0F),
        ..ThcConfig::default()
    }
}
