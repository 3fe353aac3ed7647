use std::io::Write;

use reflowlib::protocol::Telemetry;
use reflowlib::ClientError;

#[derive(clap::Args, Debug)]
pub struct MonitorOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,

    /// Stream samples to a CSV file (Time,Temperature).
    #[arg(long)]
    csv: Option<std::path::PathBuf>,
}

impl crate::ToolRun for MonitorOpts {
    fn run(&self) -> anyhow::Result<()> {
        let port = self.port.open()?;
        let mut client = reflowlib::Client::new_std(port);

        let mut csv = match &self.csv {
            Some(path) => {
                let mut file = std::fs::File::create(path)?;
                writeln!(file, "Time,Temperature")?;
                Some(file)
            }
            None => None,
        };

        eprintln!("Waiting for oven...");

        // sample ordinal; the oven reports every tenth of a second
        let mut tick: u64 = 0;
        let mut seen_any = false;

        loop {
            let mut frames = Vec::new();
            match client.pump(|frame| frames.push(*frame)) {
                Ok(_) => {}
                Err(ClientError::Io(ref e))
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock
                    ) =>
                {
                    // time-outs are ok, the oven just has nothing to say
                    continue;
                }
                Err(e) => {
                    eprintln!("Connection lost: {}", e);
                    break;
                }
            }

            for frame in &frames {
                if !seen_any {
                    seen_any = true;
                    eprintln!("Oven detected.");
                }

                print_frame(tick, frame);
                if let Some(file) = csv.as_mut() {
                    writeln!(file, "{},{}", tick, frame.average_celsius())?;
                }
                tick += 1;
            }
        }

        if let Some(file) = csv.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn print_frame(tick: u64, frame: &Telemetry) {
    println!(
        "{:>8}  {:07.2}C  mode {}, {} ({})  fan {}  lamp {}",
        tick,
        frame.average_celsius(),
        frame.mode,
        frame.stage,
        frame.run_mode,
        if frame.fan_on { "ON" } else { "OFF" },
        if frame.lamp_on { "ON" } else { "OFF" },
    );
}
