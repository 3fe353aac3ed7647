use crate::protocol::serialize::SerializerIo;
use crate::protocol::{
    MessageSerialize, Mode, ReflowProfile, Resynchronizer, RunMode, SetMode, SetProfile, Telemetry,
};
use crate::status::{OvenStatus, StatusLatch};
use crate::window::TelemetryWindow;

/// Re-export to allow using [Client] with [std::io] streams.
#[cfg(feature = "std")]
pub use embedded_io_adapters::std::FromStd;

/// An error type for [Client].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClientError<E> {
    /// EOF in underlying stream.
    UnexpectedEof,
    /// The connection is gone; this client refuses further traffic.
    NotConnected,
    /// Other IO error in underlying stream.
    Io(E),
}

#[cfg(feature = "std")]
impl<E> std::error::Error for ClientError<E> where E: core::fmt::Debug {}

impl<E> core::fmt::Display for ClientError<E>
where
    E: core::fmt::Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match self {
            Self::UnexpectedEof => write!(f, "unexpected eof"),
            Self::NotConnected => write!(f, "not connected"),
            Self::Io(e) => write!(f, "io error: {:?}", e),
        }
    }
}

impl<E> From<E> for ClientError<E> {
    fn from(other: E) -> Self {
        Self::Io(other)
    }
}

/// Bytes requested from the port in one [Client::pump] pass.
const READ_CHUNK: usize = 64;

/// Host side of one oven connection.
///
/// Owns the port plus all per-connection protocol state: the stream
/// resynchronizer, the status latch, and the rolling telemetry window.
/// Tearing a connection down is plain drop; there is no cleanup
/// protocol to run.
#[derive(Debug)]
pub struct Client<F> {
    port: F,
    resync: Resynchronizer,
    latch: StatusLatch,
    window: TelemetryWindow,
    connected: bool,
}

impl<F> Client<F> {
    /// Create a new client with a default-capacity window.
    pub fn new(port: F) -> Self {
        Self::new_with(TelemetryWindow::default(), port)
    }

    /// Create a new client with the provided telemetry window.
    pub fn new_with(window: TelemetryWindow, port: F) -> Self {
        Self {
            port,
            resync: Resynchronizer::new(),
            latch: StatusLatch::new(),
            window,
            connected: true,
        }
    }

    /// Release the underlying port.
    pub fn free(self) -> F {
        self.port
    }

    /// Get the underlying port.
    pub fn port(&self) -> &F {
        &self.port
    }

    /// Get the underlying port, mutably.
    ///
    /// Reading from it directly may cause the client to miss frames.
    pub fn port_mut(&mut self) -> &mut F {
        &mut self.port
    }

    /// The rolling temperature window for this connection.
    pub fn window(&self) -> &TelemetryWindow {
        &self.window
    }

    /// The rolling temperature window, mutably. Clear it when a new
    /// run starts.
    pub fn window_mut(&mut self) -> &mut TelemetryWindow {
        &mut self.window
    }

    /// Status last reported by the oven, or [None] before the first
    /// frame arrives.
    pub fn status(&self) -> Option<OvenStatus> {
        self.latch.current()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Mark the connection gone. Later pumps and sends fail fast with
    /// [ClientError::NotConnected].
    ///
    /// Recoverable conditions (read timeouts, `WouldBlock`) surface as
    /// [ClientError::Io] without tripping this; the transport-owning
    /// caller decides which errors are fatal.
    pub fn disconnect(&mut self) {
        self.connected = false;
    }

    /// Read available bytes once and process every frame they complete.
    ///
    /// Frames are applied strictly in arrival order: the latch and the
    /// window are updated before `on_frame` sees each decode. Returns
    /// the number of frames processed, which is routinely zero while a
    /// frame is still in flight.
    pub fn pump<H>(&mut self, mut on_frame: H) -> Result<usize, ClientError<F::Error>>
    where
        F: embedded_io::Read,
        H: FnMut(&Telemetry),
    {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }

        let mut chunk = [0u8; READ_CHUNK];
        let amt = self.port.read(&mut chunk)?;
        if amt == 0 {
            // end of file is an error, and the end of the connection
            self.connected = false;
            return Err(ClientError::UnexpectedEof);
        }

        let mut count = 0;
        let Self {
            resync,
            latch,
            window,
            ..
        } = self;
        for payload in resync.feed(&chunk[..amt]) {
            let frame = Telemetry::decode(&payload);
            latch.update(&frame);
            window.append(frame.average_celsius());
            on_frame(&frame);
            count += 1;
        }

        Ok(count)
    }

    /// Write a command frame to the port.
    pub fn send<M>(&mut self, msg: &M) -> Result<(), ClientError<F::Error>>
    where
        F: embedded_io::Write,
        M: MessageSerialize,
    {
        if !self.connected {
            return Err(ClientError::NotConnected);
        }
        let mut ser = SerializerIo::new(&mut self.port);
        msg.frame(&mut ser)?;
        self.port.flush()?;
        Ok(())
    }

    /// Command a mode change.
    pub fn send_set_mode(
        &mut self,
        mode: Mode,
        run_mode: RunMode,
    ) -> Result<(), ClientError<F::Error>>
    where
        F: embedded_io::Write,
    {
        self.send(&SetMode { mode, run_mode })
    }

    /// Upload a reflow profile.
    pub fn send_set_profile(&mut self, profile: ReflowProfile) -> Result<(), ClientError<F::Error>>
    where
        F: embedded_io::Write,
    {
        self.send(&SetProfile { profile })
    }
}

#[cfg(feature = "std")]
impl<F> Client<FromStd<F>> {
    /// Create a new client over an [std::io] stream.
    pub fn new_std(port: F) -> Self {
        Self::new(FromStd::new(port))
    }

    /// Create a new client over an [std::io] stream, with the provided
    /// telemetry window.
    pub fn new_std_with(window: TelemetryWindow, port: F) -> Self {
        Self::new_with(window, FromStd::new(port))
    }
}

#[cfg(test)]
#[cfg(feature = "std")]
mod test {
    use super::*;
    use crate::protocol::serialize::{Serializer, SerializerVec};
    use crate::protocol::Stage;

    fn telemetry(mode: Mode, centidegrees: u32) -> Telemetry {
        Telemetry {
            mode,
            run_mode: RunMode::Profile,
            stage: Stage::SoakRamp,
            fan_on: false,
            lamp_on: true,
            temp1: centidegrees,
            temp2: centidegrees,
        }
    }

    fn stream_of(frames: &[Telemetry], leading_noise: &[u8]) -> Vec<u8> {
        let mut ser = SerializerVec::new();
        let _ = ser.write_bytes(leading_noise);
        for frame in frames {
            frame.frame(&mut ser).unwrap();
        }
        ser.done()
    }

    #[test]
    fn pump_decodes_latches_and_appends() {
        let frames = [
            telemetry(Mode::Heating, 2500),
            telemetry(Mode::Holding, 15000),
        ];
        let stream = stream_of(&frames, b"\x11\x22");

        let mut client = Client::new_std(std::io::Cursor::new(stream));
        let mut seen = Vec::new();
        let count = client.pump(|frame| seen.push(*frame)).unwrap();

        assert_eq!(count, 2);
        assert_eq!(seen, frames);
        assert_eq!(client.status().map(|s| s.mode), Some(Mode::Holding));
        let window: Vec<_> = client.window().snapshot().collect();
        assert_eq!(window, vec![(0, 25.0), (1, 150.0)]);
    }

    #[test]
    fn pump_eof_disconnects() {
        let stream = stream_of(&[telemetry(Mode::Standby, 2000)], b"");
        let mut client = Client::new_std(std::io::Cursor::new(stream));

        assert_eq!(client.pump(|_| {}).unwrap(), 1);
        assert!(matches!(
            client.pump(|_| {}),
            Err(ClientError::UnexpectedEof)
        ));
        assert!(!client.is_connected());
        assert!(matches!(client.pump(|_| {}), Err(ClientError::NotConnected)));
    }

    #[test]
    fn send_writes_framed_command() {
        let mut client = Client::new_std(Vec::new());
        client
            .send_set_mode(Mode::Heating, RunMode::Profile)
            .unwrap();
        client
            .send_set_profile(ReflowProfile {
                soak_time: 90,
                soak_temp: 150,
                peak_time: 30,
                peak_temp: 230,
            })
            .unwrap();

        let written = client.free().into_inner();
        assert_eq!(
            written,
            b"\xfa\xaf\x01\x01\x01\xfa\xaf\x02\x5a\x00\x96\x00\x1e\x00\xe6\x00"
        );
    }

    #[test]
    fn send_after_disconnect_is_refused() {
        let mut client = Client::new_std(Vec::new());
        client.disconnect();
        assert!(matches!(
            client.send_set_mode(Mode::Standby, RunMode::Off),
            Err(ClientError::NotConnected)
        ));
    }
}
