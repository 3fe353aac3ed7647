use clap::Parser;

mod common;
mod control;
mod monitor;
mod simulate;

pub trait ToolRun {
    fn run(&self) -> anyhow::Result<()>;
}

#[derive(clap::Parser, Debug)]
#[command(about = "Host tool for a serial reflow oven controller")]
struct ToolOptions {
    #[command(subcommand)]
    command: ToolCommand,
}

#[derive(clap::Subcommand, Debug)]
enum ToolCommand {
    /// Watch live telemetry from the oven.
    Monitor(monitor::MonitorOpts),
    /// Upload a profile and start a reflow run.
    Start(control::StartOpts),
    /// Return the oven to standby.
    Stop(control::StopOpts),
    /// Send a raw mode change.
    SetMode(control::SetModeOpts),
    /// Upload a reflow profile without starting it.
    UploadProfile(control::UploadProfileOpts),
    /// Pretend to be an oven, for testing without hardware.
    Simulate(simulate::SimulateOpts),
}

impl ToolRun for ToolCommand {
    fn run(&self) -> anyhow::Result<()> {
        use ToolCommand::*;
        match self {
            Monitor(o) => o.run(),
            Start(o) => o.run(),
            Stop(o) => o.run(),
            SetMode(o) => o.run(),
            UploadProfile(o) => o.run(),
            Simulate(o) => o.run(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    ToolOptions::parse().command.run()
}
