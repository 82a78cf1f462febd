mod commands;
mod config;

use anyhow::Context;
use commands::{CommandLine, Commands, OutputFormat, ScanArgs};
use config::Settings;
use nut_client::{Client, ClientConfig, Device};
use nut_scanner::{DiscoveredDevice, Scanner};
use tracing::warn;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();
    init_logging(cli.verbose);

    let settings = Settings::load(cli.config.as_deref())?;

    match cli.command {
        Commands::List => with_client(settings.client_config(&cli.server), list),
        Commands::Get { device, variable } => {
            with_client(settings.client_config(&cli.server), |client| {
                let var = client
                    .device(&device)?
                    .variable(&variable)?
                    .with_context(|| format!("{} has no variable {}", device, variable))?;
                let value = var
                    .value()?
                    .with_context(|| format!("no value for {}", variable))?;
                println!("{}", value);
                Ok(())
            })
        }
        Commands::Set {
            device,
            variable,
            value,
        } => with_client(settings.client_config(&cli.server), |client| {
            set_variable(client, &device, &variable, &value)
        }),
        Commands::Cmd { device, command } => {
            with_client(settings.client_config(&cli.server), |client| {
                run_command(client, &device, &command)
            })
        }
        Commands::Version => with_client(settings.client_config(&cli.server), |client| {
            println!("server:   {}", client.server_version()?);
            println!("protocol: {}", client.protocol_version()?);
            Ok(())
        }),
        Commands::Scan(args) => scan(&settings, &args),
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Connect, run `f`, then log out.
fn with_client<F>(config: ClientConfig, f: F) -> anyhow::Result<()>
where
    F: FnOnce(&Client) -> anyhow::Result<()>,
{
    let target = format!("{}:{}", config.host, config.port);
    let mut client = Client::with_config(config);
    client
        .connect()
        .with_context(|| format!("connecting to {}", target))?;
    let result = f(&client);
    client.logout();
    result
}

fn list(client: &Client) -> anyhow::Result<()> {
    let devices = client
        .device_list()?
        .context("server sent a malformed device list")?;
    for device in &devices {
        print_device(device);
    }
    Ok(())
}

/// `SET VAR` needs only the user's SET rights; no `LOGIN` is sent.
fn set_variable(client: &Client, device: &str, variable: &str, value: &str) -> anyhow::Result<()> {
    client
        .device(device)?
        .variable(variable)?
        .with_context(|| format!("{} has no variable {}", device, variable))?
        .set_value(value)?;
    Ok(())
}

fn run_command(client: &Client, device: &str, command: &str) -> anyhow::Result<()> {
    client.device(device)?.command(command)?.execute()?;
    Ok(())
}

fn print_device(device: &Device) {
    match device.description() {
        Ok(Some(desc)) => println!("DEV {} : {}", device.name(), desc),
        Ok(None) => println!("DEV {}", device.name()),
        Err(e) => {
            warn!("{}: description: {}", device.name(), e);
            println!("DEV {}", device.name());
        }
    }

    match device.variable_list() {
        Ok(Some(vars)) if vars.is_empty() => println!("  NO VAR"),
        Ok(Some(vars)) => {
            for var in vars {
                let value = var.value().ok().flatten().unwrap_or_default();
                match var.description().ok().flatten() {
                    Some(desc) => println!("  VAR {} = {} ({})", var.name(), value, desc),
                    None => println!("  VAR {} = {}", var.name(), value),
                }
            }
        }
        Ok(None) => println!("  NULL VAR"),
        Err(e) => warn!("{}: variables: {}", device.name(), e),
    }

    match device.command_list() {
        Ok(Some(cmds)) if cmds.is_empty() => println!("  NO CMD"),
        Ok(Some(cmds)) => {
            for cmd in cmds {
                match cmd.description().ok().flatten() {
                    Some(desc) => println!("  CMD {} : {}", cmd.name(), desc),
                    None => println!("  CMD {}", cmd.name()),
                }
            }
        }
        Ok(None) => println!("  NULL CMD"),
        Err(e) => warn!("{}: commands: {}", device.name(), e),
    }
}

fn scan(settings: &Settings, args: &ScanArgs) -> anyhow::Result<()> {
    let config = settings.scan_config(args)?;
    let devices = Scanner::new(config).scan()?;
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&devices)?),
        OutputFormat::Text => {
            for device in &devices {
                println!("{}", format_device(device));
            }
        }
    }
    Ok(())
}

/// One-line text form: `DRIVER key=value key ...`.
fn format_device(device: &DiscoveredDevice) -> String {
    let mut line = device.driver().to_string();
    for (key, value) in device.properties() {
        line.push(' ');
        line.push_str(key);
        if let Some(value) = value {
            line.push_str("=\"");
            line.push_str(&nut_protocol::escape(value));
            line.push('"');
        }
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use nut_client::LineTransport;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;
    use std::rc::Rc;

    struct Replay {
        replies: VecDeque<&'static str>,
        sent: Rc<RefCell<Vec<String>>>,
    }

    impl LineTransport for Replay {
        fn write_line(&mut self, line: &str) -> io::Result<()> {
            self.sent.borrow_mut().push(line.to_string());
            Ok(())
        }

        fn read_line(&mut self) -> io::Result<Option<String>> {
            Ok(self.replies.pop_front().map(str::to_string))
        }

        fn close(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn replay_client(replies: &[&'static str]) -> (Client, Rc<RefCell<Vec<String>>>) {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let transport = Replay {
            replies: replies.iter().copied().collect(),
            sent: sent.clone(),
        };
        let mut client = Client::new();
        client.connect_transport(Box::new(transport)).unwrap();
        (client, sent)
    }

    #[test]
    fn test_set_sends_no_login() {
        let (client, sent) = replay_client(&[
            "UPSDESC ups1 \"x\"",
            "VAR ups1 battery.charge.low \"20\"",
            "OK",
        ]);
        set_variable(&client, "ups1", "battery.charge.low", "30").unwrap();
        assert_eq!(
            *sent.borrow(),
            vec![
                "GET UPSDESC ups1",
                "GET VAR ups1 battery.charge.low",
                "SET VAR ups1 battery.charge.low \"30\"",
            ]
        );
    }

    #[test]
    fn test_cmd_sends_no_login() {
        let (client, sent) = replay_client(&[
            "UPSDESC ups1 \"x\"",
            "CMDDESC ups1 beeper.mute \"Mute the beeper\"",
            "OK",
        ]);
        run_command(&client, "ups1", "beeper.mute").unwrap();
        assert_eq!(
            *sent.borrow(),
            vec![
                "GET UPSDESC ups1",
                "GET CMDDESC ups1 beeper.mute",
                "INSTCMD ups1 beeper.mute",
            ]
        );
    }

    #[test]
    fn test_format_device() {
        let device = nut_scanner::parse_line("USB:driver=usbhid-ups,desc=\"a \\\"b\\\"\",nolock")
            .unwrap();
        assert_eq!(
            format_device(&device),
            "USB driver=\"usbhid-ups\" desc=\"a \\\"b\\\"\" nolock"
        );
    }
}
