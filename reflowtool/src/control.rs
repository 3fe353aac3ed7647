use reflowlib::protocol::{Mode, ReflowProfile, RunMode};

#[derive(clap::Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Soak dwell time, seconds.
    #[arg(long, default_value_t = 90)]
    soak_time: u16,
    /// Soak temperature, whole °C.
    #[arg(long, default_value_t = 150)]
    soak_temp: u16,
    /// Peak dwell time, seconds.
    #[arg(long, default_value_t = 30)]
    peak_time: u16,
    /// Peak temperature, whole °C.
    #[arg(long, default_value_t = 230)]
    peak_temp: u16,
}

impl ProfileArgs {
    fn profile(&self) -> ReflowProfile {
        ReflowProfile {
            soak_time: self.soak_time,
            soak_temp: self.soak_temp,
            peak_time: self.peak_time,
            peak_temp: self.peak_temp,
        }
    }
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    match s {
        "standby" => Ok(Mode::Standby),
        "heating" => Ok(Mode::Heating),
        "holding" => Ok(Mode::Holding),
        "cooling" => Ok(Mode::Cooling),
        _ => Err(format!(
            "unknown mode {:?} (expected standby, heating, holding, or cooling)",
            s
        )),
    }
}

fn parse_run_mode(s: &str) -> Result<RunMode, String> {
    match s {
        "off" => Ok(RunMode::Off),
        "profile" => Ok(RunMode::Profile),
        "hold" => Ok(RunMode::Hold),
        _ => Err(format!(
            "unknown run mode {:?} (expected off, profile, or hold)",
            s
        )),
    }
}

#[derive(clap::Args, Debug)]
pub struct StartOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    profile: ProfileArgs,
}

impl crate::ToolRun for StartOpts {
    fn run(&self) -> anyhow::Result<()> {
        let mut client = reflowlib::Client::new_std(self.port.open()?);
        client.send_set_profile(self.profile.profile())?;
        client.send_set_mode(Mode::Heating, RunMode::Profile)?;
        eprintln!(
            "Run started: soak {}C for {}s, peak {}C for {}s.",
            self.profile.soak_temp,
            self.profile.soak_time,
            self.profile.peak_temp,
            self.profile.peak_time
        );
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct StopOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
}

impl crate::ToolRun for StopOpts {
    fn run(&self) -> anyhow::Result<()> {
        let mut client = reflowlib::Client::new_std(self.port.open()?);
        client.send_set_mode(Mode::Standby, RunMode::Profile)?;
        eprintln!("Oven returned to standby.");
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct SetModeOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,

    /// standby, heating, holding, or cooling.
    #[arg(value_parser = parse_mode)]
    mode: Mode,
    /// off, profile, or hold.
    #[arg(value_parser = parse_run_mode)]
    run_mode: RunMode,
}

impl crate::ToolRun for SetModeOpts {
    fn run(&self) -> anyhow::Result<()> {
        let mut client = reflowlib::Client::new_std(self.port.open()?);
        client.send_set_mode(self.mode, self.run_mode)?;
        eprintln!("Sent mode {}, run mode {}.", self.mode, self.run_mode);
        Ok(())
    }
}

#[derive(clap::Args, Debug)]
pub struct UploadProfileOpts {
    #[command(flatten)]
    port: crate::common::SerialPortArgs,
    #[command(flatten)]
    profile: ProfileArgs,
}

impl crate::ToolRun for UploadProfileOpts {
    fn run(&self) -> anyhow::Result<()> {
        let mut client = reflowlib::Client::new_std(self.port.open()?);
        client.send_set_profile(self.profile.profile())?;
        eprintln!("Profile uploaded.");
        Ok(())
    }
}
