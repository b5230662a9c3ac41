//! Interactive console for sending and requesting reports.
//!
//! Register a device by VID/PID, pick a command from the library (or type a
//! new one as hex bytes, optionally saving it by name) and send it as a
//! Feature or Output report. Feature and Input reports can be requested and
//! are printed in hex.
//!
//! Run with: cargo run --example console_control -- --vid 1b1c --pid 1b2e

use clap::{Parser, ValueEnum};
use hid_report_session::{
    Command, CommandLibrary, DeviceIdentity, HidApiTransport, HidSession, IncomingReport,
    OutgoingReport, ReportOutcome, SessionConfig, TransferMode,
};
use std::io::{self, BufRead, Write};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "console_control", about = "Send and request HID reports")]
struct Cli {
    /// Vendor ID in hex
    #[arg(long, default_value = "1b1c")]
    vid: String,

    /// Product ID in hex
    #[arg(long, default_value = "1b2e")]
    pid: String,

    /// Interrupt transfer timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Pipe used for Output and Input reports
    #[arg(long, value_enum, default_value = "interrupt")]
    mode: Mode,
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Interrupt,
    Control,
}

impl From<Mode> for TransferMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Interrupt => TransferMode::Interrupt,
            Mode::Control => TransferMode::Control,
        }
    }
}

fn default_library() -> CommandLibrary {
    let mut library = CommandLibrary::new();
    for (name, line) in [
        ("Lights On", "07 FF 00 00"),
        ("Lights Off", "07 00 00 00"),
        ("Status", "02"),
    ] {
        let mut command = Command::named(name);
        let added = command
            .append_line(line)
            .and_then(|_| library.add(command));
        if let Err(e) = added {
            eprintln!("Skipping built-in command '{}': {}", name, e);
        }
    }
    library
}

fn prompt(input: &mut impl BufRead, text: &str) -> io::Result<Option<String>> {
    print!("{}", text);
    io::stdout().flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Offers to store `command` in the library under a name of the user's choice.
fn offer_save(
    input: &mut impl BufRead,
    library: &mut CommandLibrary,
    command: &Command,
) -> io::Result<()> {
    let Some(answer) = prompt(input, "Would you like to save this command? (y/n): ")? else {
        return Ok(());
    };
    if !answer.eq_ignore_ascii_case("y") {
        return Ok(());
    }
    let Some(name) = prompt(input, "Save as: ")? else {
        return Ok(());
    };
    let mut saved = command.clone();
    saved.set_name(name);
    match library.add(saved) {
        Ok(()) => println!("Saved. {} command(s) in the library.", library.len()),
        Err(e) => println!("Not saved: {}", e),
    }
    Ok(())
}

fn choose_command(
    input: &mut impl BufRead,
    library: &mut CommandLibrary,
    current: &mut Command,
) -> io::Result<()> {
    for (i, command) in library.iter().enumerate() {
        println!("  {}) {}", i + 1, command.name().unwrap_or("<unnamed>"));
    }
    println!("  n) New command from hex bytes");
    println!("  d) Delete a saved command");
    let Some(choice) = prompt(input, "Command: ")? else {
        return Ok(());
    };
    if choice.eq_ignore_ascii_case("n") {
        let Some(line) = prompt(input, "Hex bytes (e.g. 07 FF 00): ")? else {
            return Ok(());
        };
        let mut command = Command::named("Custom");
        match command.append_line(&line) {
            Ok(n) => {
                println!("Parsed {} byte(s).", n);
                offer_save(input, library, &command)?;
                *current = command;
            }
            Err(e) => println!("{}", e),
        }
        return Ok(());
    }
    if choice.eq_ignore_ascii_case("d") {
        println!("Saved: {}", library.names().collect::<Vec<_>>().join(", "));
        let Some(name) = prompt(input, "Delete: ")? else {
            return Ok(());
        };
        match library.remove(&name) {
            Some(_) => println!("Deleted '{}'.", name),
            None => println!("No command named '{}'.", name),
        }
        return Ok(());
    }
    match choice
        .parse::<usize>()
        .ok()
        .and_then(|i| i.checked_sub(1))
        .and_then(|i| library.get_index(i))
    {
        Some(command) => *current = command.clone(),
        None => println!("No such command."),
    }
    Ok(())
}

fn send_menu(
    input: &mut impl BufRead,
    session: &HidSession<HidApiTransport>,
    library: &mut CommandLibrary,
    current: &mut Command,
) -> io::Result<()> {
    loop {
        println!("\nSend Report: 1) Feature  2) Output  3) Change command  4) View command  b) Back");
        let Some(choice) = prompt(input, "> ")? else {
            return Ok(());
        };
        let report = match choice.as_str() {
            "1" => OutgoingReport::Feature,
            "2" => OutgoingReport::Output,
            "3" => {
                choose_command(input, library, current)?;
                continue;
            }
            "4" => {
                print!("{}", current);
                continue;
            }
            "b" | "B" => return Ok(()),
            _ => continue,
        };
        match session.send_report(report, current) {
            Ok(ReportOutcome::Completed(())) => println!("Report sent."),
            Ok(ReportOutcome::Unsupported(kind)) => {
                println!("The device doesn't have a {} report.", kind)
            }
            Err(e) => println!("Send failed: {}", e),
        }
    }
}

fn get_menu(input: &mut impl BufRead, session: &HidSession<HidApiTransport>) -> io::Result<()> {
    println!("\nGet Report: 1) Feature  2) Input");
    let report = match prompt(input, "> ")?.as_deref() {
        Some("1") => IncomingReport::Feature,
        Some("2") => IncomingReport::Input,
        _ => return Ok(()),
    };
    match session.get_report(report) {
        Ok(ReportOutcome::Completed(buffer)) => {
            println!("Report ID 0x{:02X}", buffer.report_id());
            for (i, byte) in buffer.payload().iter().enumerate() {
                println!("\t{}). 0x{:02X}", i + 1, byte);
            }
        }
        Ok(ReportOutcome::Unsupported(kind)) => {
            println!("The device doesn't have a {} report.", kind)
        }
        Err(e) => println!("Get failed: {}", e),
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let identity = DeviceIdentity::parse(&cli.vid, &cli.pid)?;
    let config = SessionConfig::default()
        .with_transfer_mode(cli.mode.into())
        .with_transfer_timeout(Duration::from_millis(cli.timeout_ms));
    let mut session = HidSession::with_config(HidApiTransport::new()?, identity, config);

    let mut library = default_library();
    let mut current = library.get_index(0).cloned().unwrap_or_default();

    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!(
            "\n[{} | {:?} | {:?}]",
            session.identity(),
            session.state(),
            session.config().transfer_mode
        );
        println!("1) Register device  2) Send report  3) Get report  4) Toggle transfer mode  q) Quit");
        let Some(choice) = prompt(&mut input, "> ")? else {
            break;
        };
        match choice.as_str() {
            "1" => {
                let Some(vid) = prompt(&mut input, "Vendor ID (hex): ")? else {
                    break;
                };
                let Some(pid) = prompt(&mut input, "Product ID (hex): ")? else {
                    break;
                };
                match DeviceIdentity::parse(&vid, &pid) {
                    Ok(id) if session.locate_and_open(id) => {
                        println!("Device {} registered.", id);
                        if let Some(caps) = session.capabilities() {
                            println!(
                                "Input: {} bytes, Output: {} bytes, Feature: {} bytes",
                                caps.input_report_length,
                                caps.output_report_length,
                                caps.feature_report_length
                            );
                        }
                    }
                    Ok(id) => println!("Device {} not found.", id),
                    Err(e) => println!("{}", e),
                }
            }
            "2" => send_menu(&mut input, &session, &mut library, &mut current)?,
            "3" => get_menu(&mut input, &session)?,
            "4" => {
                let next = match session.config().transfer_mode {
                    TransferMode::Interrupt => TransferMode::Control,
                    TransferMode::Control => TransferMode::Interrupt,
                };
                session.set_transfer_mode(next);
                println!("Using {:?} transfers.", next);
            }
            "q" | "Q" => break,
            _ => {}
        }
    }
    Ok(())
}
