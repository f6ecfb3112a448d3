use std::io::{self, Seek, SeekFrom, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{rle, xor_delta, FrameStorage, Header, MAGIC, VERSION};
use crate::error::Result;
use crate::models::StoragePolicy;

/// Streams frame records into a seekable sink.
///
/// The frame count is unknown until [`finalize`](Self::finalize), which
/// seeks back and patches it in.
#[derive(Debug)]
pub struct ContainerWriter<W: Write + Seek> {
    sink: W,
    policy: StoragePolicy,
    count_offset: u64,
    frame_count: u32,
    previous: Option<Vec<u8>>,
}

impl<W: Write + Seek> ContainerWriter<W> {
    /// Write the header and palette table, leaving room for the frame count.
    pub fn begin(mut sink: W, header: &Header, policy: StoragePolicy) -> Result<Self> {
        sink.write_all(MAGIC)?;
        sink.write_u8(VERSION)?;
        sink.write_u16::<LittleEndian>(header.width)?;
        sink.write_u16::<LittleEndian>(header.height)?;
        sink.write_u8(header.geometry.width() as u8)?;
        sink.write_u8(header.geometry.height() as u8)?;
        sink.write_u8(header.geometry.mode())?;
        sink.write_u16::<LittleEndian>(header.palette.len() as u16)?;
        sink.write_all(&header.palette.to_rgb_bytes())?;

        let count_offset = sink.stream_position()?;
        sink.write_u32::<LittleEndian>(0)?;

        Ok(Self {
            sink,
            policy,
            count_offset,
            frame_count: 0,
            previous: None,
        })
    }

    pub fn frame_count(&self) -> u32 {
        self.frame_count
    }

    /// Store one raw frame payload, choosing its storage per policy.
    pub fn append_frame(&mut self, payload: &[u8]) -> Result<FrameStorage> {
        let frame_count = self
            .frame_count
            .checked_add(1)
            .ok_or_else(|| invalid_input("frame count exceeds u32"))?;

        let (storage, stored) = match self.policy {
            StoragePolicy::Full => (FrameStorage::Raw, payload.to_vec()),
            StoragePolicy::Delta => self.smallest(payload),
        };
        let len = u32::try_from(stored.len()).map_err(|_| invalid_input("frame payload exceeds u32"))?;

        self.sink.write_u8(storage.flags())?;
        self.sink.write_u32::<LittleEndian>(len)?;
        self.sink.write_all(&stored)?;

        self.frame_count = frame_count;
        self.previous = Some(payload.to_vec());
        Ok(storage)
    }

    /// Smallest of raw, RLE and XOR+RLE; ties keep the earlier choice.
    fn smallest(&self, payload: &[u8]) -> (FrameStorage, Vec<u8>) {
        let mut best = (FrameStorage::Raw, payload.to_vec());

        let rle = rle::encode(payload);
        if rle.len() < best.1.len() {
            best = (FrameStorage::Rle, rle);
        }

        if let Some(previous) = self.previous.as_deref().filter(|p| p.len() == payload.len()) {
            let delta = rle::encode(&xor_delta(payload, previous));
            if delta.len() < best.1.len() {
                best = (FrameStorage::DeltaRle, delta);
            }
        }
        best
    }

    /// Patch the frame count, flush, and hand the sink back.
    pub fn finalize(mut self) -> Result<W> {
        let end = self.sink.stream_position()?;
        self.sink.seek(SeekFrom::Start(self.count_offset))?;
        self.sink.write_u32::<LittleEndian>(self.frame_count)?;
        self.sink.seek(SeekFrom::Start(end))?;
        self.sink.flush()?;
        Ok(self.sink)
    }

    /// Hand the sink back as is. The stored frame count stays zero, so
    /// readers reject anything written after the header.
    pub fn into_inner(self) -> W {
        self.sink
    }
}

fn invalid_input(message: &str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CellGeometry;
    use ctif_dither::{Palette, Rgb};
    use std::io::Cursor;
    use std::sync::Arc;

    fn header() -> Header {
        Header {
            width: 4,
            height: 2,
            geometry: CellGeometry::Single,
            palette: Arc::new(Palette::new(&[Rgb::BLACK, Rgb::new(1, 2, 3)]).unwrap()),
        }
    }

    #[test]
    fn test_header_layout() {
        let writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Full).unwrap();
        let bytes = writer.finalize().unwrap().into_inner();
        assert_eq!(
            bytes,
            vec![
                b'C', b'T', b'I', b'F', 1, // magic, version
                4, 0, 2, 0, // width, height
                1, 1, 0, // cell_w, cell_h, mode
                2, 0, // palette size
                0, 0, 0, 1, 2, 3, // palette
                0, 0, 0, 0, // frame count
            ]
        );
    }

    #[test]
    fn test_frame_count_is_patched() {
        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Full).unwrap();
        for _ in 0..3 {
            assert_eq!(writer.append_frame(&[0xAA]).unwrap(), FrameStorage::Raw);
        }
        assert_eq!(writer.frame_count(), 3);
        let bytes = writer.finalize().unwrap().into_inner();
        assert_eq!(&bytes[20..24], &[3, 0, 0, 0]);
        assert_eq!(&bytes[24..30], &[0, 1, 0, 0, 0, 0xAA]);
        assert_eq!(bytes.len(), 24 + 3 * 6);
    }

    #[test]
    fn test_into_inner_leaves_count_unpatched() {
        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Full).unwrap();
        writer.append_frame(&[0xAA]).unwrap();
        let bytes = writer.into_inner().into_inner();
        assert_eq!(&bytes[20..24], &[0, 0, 0, 0]);
        assert_eq!(bytes.len(), 24 + 6);
    }

    #[test]
    fn test_delta_policy_choices() {
        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Delta).unwrap();
        let noisy: Vec<u8> = (0..32).collect();
        // Nothing to gain on the first frame
        assert_eq!(writer.append_frame(&noisy).unwrap(), FrameStorage::Raw);
        // Identical frame: XOR is all zero
        assert_eq!(writer.append_frame(&noisy).unwrap(), FrameStorage::DeltaRle);
        // A flat frame compresses on its own just as well
        assert_eq!(writer.append_frame(&[7; 32]).unwrap(), FrameStorage::Rle);
    }

    #[test]
    fn test_first_frame_never_delta() {
        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Delta).unwrap();
        assert_eq!(writer.append_frame(&[0; 64]).unwrap(), FrameStorage::Rle);
    }

    #[test]
    fn test_tie_prefers_raw() {
        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &header(), StoragePolicy::Delta).unwrap();
        // One byte: raw is 1, RLE is 2
        assert_eq!(writer.append_frame(&[9]).unwrap(), FrameStorage::Raw);
    }
}
