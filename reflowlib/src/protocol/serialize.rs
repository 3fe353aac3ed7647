use super::FRAME_MARKER;

/// A byte sink for serializing messages.
pub trait Serializer {
    type Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error>;

    // everything else can be written in terms of write_u8

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        for b in val.iter() {
            self.write_u8(*b)?;
        }
        Ok(())
    }

    fn write_le_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }

    fn write_le_u32(&mut self, val: u32) -> Result<(), Self::Error> {
        self.write_bytes(&val.to_le_bytes())
    }
}

impl<S> Serializer for &mut S
where
    S: Serializer,
{
    type Error = S::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        (*self).write_u8(val)
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        (*self).write_bytes(val)
    }

    fn write_le_u16(&mut self, val: u16) -> Result<(), Self::Error> {
        (*self).write_le_u16(val)
    }

    fn write_le_u32(&mut self, val: u32) -> Result<(), Self::Error> {
        (*self).write_le_u32(val)
    }
}

/// Wrap an [embedded_io::Write] port to become a [Serializer].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SerializerIo<T> {
    inner: T,
}

impl<T> SerializerIo<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    pub fn done(self) -> T {
        self.inner
    }
}

impl<T> Serializer for SerializerIo<T>
where
    T: embedded_io::Write,
{
    type Error = T::Error;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.inner.write_all(&[val])
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.inner.write_all(val)
    }
}

/// A serializer collecting bytes into a [alloc::vec::Vec].
#[cfg(feature = "alloc")]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SerializerVec {
    data: alloc::vec::Vec<u8>,
}

#[cfg(feature = "alloc")]
impl SerializerVec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn done(self) -> alloc::vec::Vec<u8> {
        self.data
    }
}

#[cfg(feature = "alloc")]
impl Serializer for SerializerVec {
    type Error = core::convert::Infallible;

    fn write_u8(&mut self, val: u8) -> Result<(), Self::Error> {
        self.data.push(val);
        Ok(())
    }

    fn write_bytes(&mut self, val: &[u8]) -> Result<(), Self::Error> {
        self.data.extend_from_slice(val);
        Ok(())
    }
}

/// A trait for messages that can be framed onto the wire.
pub trait MessageSerialize {
    /// Type byte for command frames. [None] for telemetry, which is
    /// identified by being the only inbound frame shape.
    fn frame_type(&self) -> Option<u8>;

    /// Serialize just the message body, in wire field order.
    ///
    /// For this to work correctly, it *must* perform the same actions
    /// every time it is called with the same message. That means no
    /// IO, no funny business.
    fn message_body<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer;

    /// Serialize the message into a full frame: marker, type byte if
    /// the message carries one, then the body.
    fn frame<S>(&self, ser: &mut S) -> Result<(), S::Error>
    where
        S: Serializer,
    {
        ser.write_bytes(&FRAME_MARKER)?;
        if let Some(typ) = self.frame_type() {
            ser.write_u8(typ)?;
        }
        self.message_body(ser)
    }
}
