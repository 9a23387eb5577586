use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::Local;
use pcap_file::pcap::{PcapHeader, PcapPacket, PcapWriter};
use pcap_file::DataLink;

use crate::error::Result;

/// Records injected frames (radiotap included) to a classic pcap file.
pub struct FrameRecorder<W: Write> {
    writer: PcapWriter<W>,
    written: usize,
}

impl FrameRecorder<BufWriter<File>> {
    /// Create `<prefix>-<date>.pcap`; returns the recorder and the file name.
    pub fn create(prefix: &str) -> Result<(Self, String)> {
        let date_time = Local::now().format("-%Y-%m-%d_%H-%M-%S").to_string();
        let filename = format!("{}{}.pcap", prefix, date_time);
        let file = File::create(&filename)?;
        Ok((Self::new(BufWriter::new(file))?, filename))
    }
}

impl<W: Write> FrameRecorder<W> {
    pub fn new(out: W) -> Result<Self> {
        let header = PcapHeader {
            datalink: DataLink::IEEE802_11_RADIOTAP,
            ..Default::default()
        };
        Ok(FrameRecorder {
            writer: PcapWriter::with_header(out, header)?,
            written: 0,
        })
    }

    pub fn record(&mut self, frame: &[u8]) -> Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let packet = PcapPacket::new(timestamp, frame.len() as u32, frame);
        self.writer.write_packet(&packet)?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn finish(self) -> Result<W> {
        let mut out = self.writer.into_writer();
        out.flush()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pcap_file::pcap::PcapReader;

    use crate::modulation;
    use crate::tx::{build_test_frames, FrameContext};
    use crate::util::MacAddress;

    #[test]
    fn records_frames_as_radiotap_pcap() {
        let ctx = FrameContext::new("mon0", MacAddress::default());
        let frames = build_test_frames(&ctx, &modulation::select("HE").unwrap()).unwrap();

        let mut recorder = FrameRecorder::new(Vec::new()).unwrap();
        for frame in &frames {
            recorder.record(&frame.bytes).unwrap();
        }
        assert_eq!(recorder.written(), frames.len());
        let bytes = recorder.finish().unwrap();

        let mut reader = PcapReader::new(bytes.as_slice()).unwrap();
        assert_eq!(reader.header().datalink, DataLink::IEEE802_11_RADIOTAP);

        let mut count = 0;
        while let Some(packet) = reader.next_packet() {
            let packet = packet.unwrap();
            assert_eq!(packet.data.as_ref(), frames[count].bytes.as_slice());
            count += 1;
        }
        assert_eq!(count, frames.len());
    }

    #[test]
    fn create_uses_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("capture");
        let (mut recorder, filename) =
            FrameRecorder::create(prefix.to_str().unwrap()).unwrap();
        recorder.record(&[0, 0, 8, 0, 0, 0, 0, 0]).unwrap();
        recorder.finish().unwrap();

        assert!(filename.ends_with(".pcap"));
        assert!(filename.contains("capture-"));
        let meta = std::fs::metadata(&filename).unwrap();
        // global header + record header + 8 bytes
        assert_eq!(meta.len(), 24 + 16 + 8);
    }
}
