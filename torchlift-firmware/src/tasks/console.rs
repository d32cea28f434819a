//! Serial console task
//!
//! Reads `$`-prefixed command lines from the console UART, applies them
//! and writes the response. `~` is handled as soon as it arrives, without
//! waiting for a line end. Newly latched faults are announced unprompted.

use core::ops::ControlFlow;

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_rp::uart::BufferedUart;
use embassy_time::{block_for, Duration};
use embedded_io_async::{Read, Write};
use heapless::Vec;

use torchlift_core::command::{parse, Command, CommandContext};
use torchlift_core::report::{fault_message, render, ReportLine};
use torchlift_core::state::ExecFlags;

use crate::board::GpioBank;
use crate::channels::{FAULTS, FAULT_LATCHED, THC};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 32;

/// Longest accepted command line
const LINE_LEN: usize = 64;

/// Delay between polls while waiting for a pin
const WAIT_POLL_US: u64 = 100;

/// Console task - command line interface on the console UART
#[embassy_executor::task]
pub async fn console_task(mut uart: BufferedUart, mut pins: GpioBank) {
    info!("Console task started");

    let mut line: Vec<u8, LINE_LEN> = Vec::new();
    let mut overflow = false;
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        let n = match select(uart.read(&mut buf), FAULT_LATCHED.wait()).await {
            Either::First(Ok(n)) => n,
            Either::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
                continue;
            }
            Either::Second(source) => {
                send(&mut uart, fault_message(source).as_bytes()).await;
                continue;
            }
        };

        for &byte in &buf[..n] {
            match byte {
                b'~' => {
                    let response = execute(Command::RestoreMovement, &mut pins);
                    send(&mut uart, response.as_bytes()).await;
                }
                b'\r' | b'\n' => {
                    if overflow {
                        warn!("Command line too long, dropped");
                        send(&mut uart, b"error: line too long").await;
                    } else if !line.is_empty() {
                        let response = handle_line(&line, &mut pins);
                        send(&mut uart, response.as_bytes()).await;
                    }
                    line.clear();
                    overflow = false;
                }
                _ => {
                    if line.push(byte).is_err() {
                        overflow = true;
                    }
                }
            }
        }
    }
}

/// Parse and apply one line, returning the report
fn handle_line(line: &[u8], pins: &mut GpioBank) -> ReportLine {
    let mut report = ReportLine::new();

    let Ok(text) = core::str::from_utf8(line) else {
        let _ = report.push_str("error: invalid text");
        return report;
    };

    match parse(text) {
        Ok(command) => {
            debug!("Command: {:?}", command);
            let _ = report.push_str(&execute(command, pins));
        }
        Err(e) => {
            warn!("Rejected command: {:?}", e);
            let _ = core::fmt::write(&mut report, format_args!("error: {:?}", e));
        }
    }
    report
}

/// Apply a command against the shared state
fn execute(command: Command, pins: &mut GpioBank) -> ReportLine {
    let mut ctx = CommandContext::new(&THC, &FAULTS, pins);
    render(&ctx.execute(command, housekeeping))
}

/// Runs on every poll of a pin wait
///
/// A wait gives up while a feed hold is pending.
fn housekeeping() -> ControlFlow<()> {
    if THC.exec_flags().contains(ExecFlags::FEED_HOLD) {
        return ControlFlow::Break(());
    }

    block_for(Duration::from_micros(WAIT_POLL_US));
    ControlFlow::Continue(())
}

/// Write one response line
async fn send(uart: &mut BufferedUart, line: &[u8]) {
    for part in [line, &b"\r\n"[..]] {
        if let Err(e) = uart.write_all(part).await {
            warn!("UART write error: {:?}", e);
            return;
        }
    }
}
