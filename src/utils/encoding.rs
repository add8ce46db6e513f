use std::io::{self, Read, Write};

/// Write a single byte
pub fn write_u8<W: Write>(writer: &mut W, value: u8) -> io::Result<()> {
    writer.write_all(&[value])
}

/// Read a single byte
pub fn read_u8<R: Read>(reader: &mut R) -> io::Result<u8> {
    let mut buf = [0u8; 1];
    reader.read_exact(&mut buf)?;
    Ok(buf[0])
}

/// Write a bool as one byte (0 or 1)
pub fn write_bool<W: Write>(writer: &mut W, value: bool) -> io::Result<()> {
    write_u8(writer, value as u8)
}

/// Read a one-byte bool. Any non-zero byte is true.
pub fn read_bool<R: Read>(reader: &mut R) -> io::Result<bool> {
    Ok(read_u8(reader)? != 0)
}

/// Write a usize in native width and byte order
pub fn write_usize_ne<W: Write>(writer: &mut W, value: usize) -> io::Result<()> {
    writer.write_all(&value.to_ne_bytes())
}

/// Read a usize in native width and byte order
pub fn read_usize_ne<R: Read>(reader: &mut R) -> io::Result<usize> {
    let mut buf = [0u8; std::mem::size_of::<usize>()];
    reader.read_exact(&mut buf)?;
    Ok(usize::from_ne_bytes(buf))
}

/// Write a native-width length followed by the raw bytes
pub fn write_len_prefixed<W: Write>(writer: &mut W, bytes: &[u8]) -> io::Result<()> {
    write_usize_ne(writer, bytes.len())?;
    writer.write_all(bytes)
}

/// Read a native-width length followed by that many raw bytes.
///
/// The buffer grows with the bytes actually read, so a corrupt length
/// cannot force a huge allocation up front.
pub fn read_len_prefixed<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let len = read_usize_ne(reader)?;
    let mut buf = Vec::with_capacity(len.min(4096));
    let read = reader.by_ref().take(len as u64).read_to_end(&mut buf)?;
    if read != len {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            format!("expected {} bytes, found {}", len, read),
        ));
    }
    Ok(buf)
}
