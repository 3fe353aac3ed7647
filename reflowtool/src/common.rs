#[derive(clap::Args, Debug, Clone)]
pub struct SerialPortArgs {
    #[arg(default_value_t = default_serial_port())]
    port: String,
    #[arg(short, long, default_value_t = reflowlib::protocol::BAUD_RATE)]
    baud: u32,
    /// Treat the port as a plain file instead of a serial device.
    #[arg(long)]
    plain_file: bool,
    /// Connect to a TCP address instead of a serial device.
    #[arg(long)]
    tcp: bool,
}

#[derive(Debug)]
pub enum SerialPort {
    Serial(std::io::BufWriter<Box<dyn serialport::SerialPort>>),
    File(std::io::BufWriter<std::fs::File>),
    Tcp(std::io::BufWriter<std::net::TcpStream>),
}

pub fn default_serial_port() -> String {
    if let Ok(infos) = serialport::available_ports() {
        for info in infos {
            #[cfg(target_os = "macos")]
            if info.port_name.ends_with(".Bluetooth-Incoming-Port") {
                // these ports are almost always *not* an oven
                continue;
            }

            #[cfg(target_os = "macos")]
            if info.port_name.starts_with("/dev/tty.") {
                // tty. ports block on flow control we don't use; cu. works
                continue;
            }

            return info.port_name.clone();
        }
    }

    // not great, but reasonable fallback
    "/dev/ttyUSB0".to_owned()
}

impl SerialPortArgs {
    pub fn open(&self) -> anyhow::Result<SerialPort> {
        if self.tcp {
            let port = std::net::TcpStream::connect(&self.port)?;
            port.set_read_timeout(Some(std::time::Duration::from_secs(1)))?;
            Ok(SerialPort::Tcp(std::io::BufWriter::new(port)))
        } else if self.plain_file {
            let port = std::fs::File::options()
                .read(true)
                .write(true)
                .open(&self.port)?;

            Ok(SerialPort::File(std::io::BufWriter::new(port)))
        } else {
            let mut port = serialport::new(&self.port, self.baud).open()?;
            port.set_timeout(std::time::Duration::from_secs(1))?;
            Ok(SerialPort::Serial(std::io::BufWriter::new(port)))
        }
    }
}

impl std::io::Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.get_mut().read(buf),
            Self::File(port) => port.get_mut().read(buf),
            Self::Tcp(port) => port.get_mut().read(buf),
        }
    }
}

impl std::io::Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match self {
            Self::Serial(port) => port.write(buf),
            Self::File(port) => port.write(buf),
            Self::Tcp(port) => port.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match self {
            Self::Serial(port) => port.flush(),
            Self::File(port) => port.flush(),
            Self::Tcp(port) => port.flush(),
        }
    }
}
