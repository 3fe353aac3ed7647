use std::io::{Read, Write};

use reflowlib::protocol::serialize::SerializerVec;
use reflowlib::protocol::{
    parse_command, HostMessage, MessageSerialize, Mode, ReflowProfile, RunMode, Stage, Telemetry,
};

#[derive(clap::Args, Debug)]
pub struct SimulateOpts {
    #[arg(default_value = "localhost:8383")]
    bind: String,
    /// Starting temperature of the simulated oven, whole °C.
    #[arg(long, default_value_t = 25)]
    ambient: u16,
}

impl crate::ToolRun for SimulateOpts {
    fn run(&self) -> anyhow::Result<()> {
        let listener = std::net::TcpListener::bind(&self.bind)?;
        eprintln!("Listening on {}.", self.bind);

        loop {
            let (stream, addr) = listener.accept()?;
            eprintln!("Connected to {}.", addr);

            // reads pace the loop; the oven reports ten times a second
            stream.set_read_timeout(Some(std::time::Duration::from_millis(100)))?;

            match Simulator::new(stream, self).simulate() {
                Err(e) => match e.downcast_ref::<std::io::Error>().map(|e| e.kind()) {
                    // an expected error, at disconnect
                    Some(
                        std::io::ErrorKind::UnexpectedEof
                        | std::io::ErrorKind::ConnectionReset
                        | std::io::ErrorKind::BrokenPipe,
                    ) => {
                        eprintln!("Disconnected from {}.", addr);
                        continue;
                    }
                    // any other error is unexpected
                    _ => anyhow::bail!(e),
                },
                // statically impossible, but ! not stable
                _ => {}
            }
        }
    }
}

struct Simulator {
    stream: std::net::TcpStream,
    inbox: Vec<u8>,

    profile: ReflowProfile,
    mode: Mode,
    run_mode: RunMode,
    stage: Stage,
    fan_on: bool,
    lamp_on: bool,

    ambient: f64,
    temp: f64,
    stage_ticks: u32,
}

impl Simulator {
    fn new(stream: std::net::TcpStream, opts: &SimulateOpts) -> Self {
        Self {
            stream,
            inbox: Vec::new(),
            profile: ReflowProfile {
                soak_time: 90,
                soak_temp: 150,
                peak_time: 30,
                peak_temp: 230,
            },
            mode: Mode::Standby,
            run_mode: RunMode::Off,
            stage: Stage::Standby,
            fan_on: false,
            lamp_on: false,
            ambient: f64::from(opts.ambient),
            temp: f64::from(opts.ambient),
            stage_ticks: 0,
        }
    }

    fn simulate(&mut self) -> anyhow::Result<()> {
        loop {
            self.poll_commands()?;
            self.step();
            self.send_telemetry()?;
        }
    }

    /// Pull whatever the host sent and act on every complete command.
    fn poll_commands(&mut self) -> anyhow::Result<()> {
        let mut chunk = [0u8; 64];
        match self.stream.read(&mut chunk) {
            Ok(0) => anyhow::bail!(std::io::Error::from(std::io::ErrorKind::UnexpectedEof)),
            Ok(amt) => self.inbox.extend_from_slice(&chunk[..amt]),
            Err(e) => {
                if let std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock = e.kind() {
                    // nothing to read this tick
                } else {
                    anyhow::bail!(e);
                }
            }
        }

        loop {
            let (consumed, msg) = parse_command(&self.inbox);
            self.inbox.drain(..consumed);
            match msg {
                Some(msg) => self.handle_message(msg),
                None => break,
            }
        }
        Ok(())
    }

    fn handle_message(&mut self, msg: HostMessage) {
        match msg {
            HostMessage::SetMode(m) => {
                self.mode = m.mode;
                self.run_mode = m.run_mode;
                match m.mode {
                    Mode::Heating => {
                        self.stage = Stage::SoakRamp;
                        self.stage_ticks = 0;
                    }
                    Mode::Standby => {
                        self.stage = Stage::Standby;
                        self.stage_ticks = 0;
                    }
                    _ => {}
                }
            }
            HostMessage::SetProfile(m) => {
                self.profile = m.profile;
            }
        }
    }

    /// Advance the thermal model by one tenth of a second.
    fn step(&mut self) {
        const RAMP_PER_TICK: f64 = 0.2;

        let target = match self.stage {
            Stage::SoakRamp | Stage::SoakHold => Some(f64::from(self.profile.soak_temp)),
            Stage::PeakRamp | Stage::PeakHold => Some(f64::from(self.profile.peak_temp)),
            _ => None,
        };

        match target {
            Some(target) if self.temp < target => {
                self.temp = (self.temp + RAMP_PER_TICK).min(target);
                self.lamp_on = true;
            }
            Some(_) => self.lamp_on = false,
            None => {
                // drift back toward ambient
                self.temp += (self.ambient - self.temp) * 0.01;
                self.lamp_on = false;
            }
        }
        self.fan_on = self.stage == Stage::Cool;

        match self.stage {
            Stage::SoakRamp => {
                if self.temp >= f64::from(self.profile.soak_temp) {
                    self.stage = Stage::SoakHold;
                    self.stage_ticks = 0;
                    self.mode = Mode::Holding;
                }
            }
            Stage::SoakHold => {
                self.stage_ticks += 1;
                if self.stage_ticks >= u32::from(self.profile.soak_time) * 10 {
                    self.stage = Stage::PeakRamp;
                    self.stage_ticks = 0;
                    self.mode = Mode::Heating;
                }
            }
            Stage::PeakRamp => {
                if self.temp >= f64::from(self.profile.peak_temp) {
                    self.stage = Stage::PeakHold;
                    self.stage_ticks = 0;
                    self.mode = Mode::Holding;
                }
            }
            Stage::PeakHold => {
                self.stage_ticks += 1;
                if self.stage_ticks >= u32::from(self.profile.peak_time) * 10 {
                    self.stage = Stage::Cool;
                    self.stage_ticks = 0;
                    self.mode = Mode::Cooling;
                }
            }
            Stage::Cool => {
                if self.temp <= self.ambient + 5.0 {
                    self.stage = Stage::Standby;
                    self.mode = Mode::Standby;
                }
            }
            _ => {}
        }
    }

    fn send_telemetry(&mut self) -> anyhow::Result<()> {
        let frame = Telemetry {
            mode: self.mode,
            run_mode: self.run_mode,
            stage: self.stage,
            fan_on: self.fan_on,
            lamp_on: self.lamp_on,
            // the two probes never quite agree
            temp1: (self.temp * 100.0) as u32,
            temp2: (self.temp * 100.0 + 50.0) as u32,
        };

        let mut ser = SerializerVec::new();
        // SerializerVec cannot fail
        let _ = frame.frame(&mut ser);
        self.stream.write_all(&ser.done())?;
        self.stream.flush()?;
        Ok(())
    }
}
