//! Layer I: 4-bit allocations, 6-bit scale factors, 12 samples per subband.

use anyhow::{Result, bail};

use crate::process::layer::tables::{requantize, scale_factors};
use crate::process::layer::{FrameContext, FrameView, LayerDecoder, SubbandRows, check_crc};
use crate::process::synth::{Real, SBLIMIT};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::FrameError;

const ROWS: usize = 12;

#[derive(Debug, Clone)]
pub struct Layer1Decoder {
    scf: [Real; 64],
}

impl Default for Layer1Decoder {
    fn default() -> Self {
        Self {
            scf: scale_factors(),
        }
    }
}

impl LayerDecoder for Layer1Decoder {
    fn decode(
        &mut self,
        _ctx: &FrameContext,
        frame: &FrameView,
        rows: &mut SubbandRows,
    ) -> Result<()> {
        let header = frame.header;
        let channels = header.channels();
        let jsbound = header.jsbound().min(SBLIMIT);

        let mut reader = BsIoSliceReader::from_slice(frame.body);
        if header.protected {
            reader.skip_n(16)?;
        }

        let mut alloc = [[0u8; SBLIMIT]; 2];
        for sb in 0..SBLIMIT {
            let shared = sb >= jsbound;
            for ch in 0..channels {
                alloc[ch][sb] = if shared && ch == 1 {
                    alloc[0][sb]
                } else {
                    reader.get_n(4)?
                };
                if alloc[ch][sb] == 15 {
                    bail!(FrameError::ForbiddenAllocation(sb));
                }
            }
        }

        let alloc_bits = reader.position()? - if header.protected { 16 } else { 0 };
        check_crc(header, &mut reader, alloc_bits)?;

        let mut scale = [[0.0; SBLIMIT]; 2];
        for sb in 0..SBLIMIT {
            for ch in 0..channels {
                if alloc[ch][sb] != 0 {
                    scale[ch][sb] = self.scf[reader.get_n::<u8>(6)? as usize];
                }
            }
        }

        for _ in 0..ROWS {
            let row = rows.push();
            for sb in 0..SBLIMIT {
                let shared = sb >= jsbound;
                let mut code = 0u32;
                for ch in 0..channels {
                    let nb = alloc[ch][sb] as u32;
                    if nb == 0 {
                        continue;
                    }
                    let bits = nb + 1;
                    if !(shared && ch == 1) {
                        code = reader.get_n(bits)?;
                    }
                    row[ch][sb] = requantize(code, (1 << bits) - 1) * scale[ch][sb];
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::testing::BitWriter;
    use crate::structs::header::FrameHeader;
    use log::Level;

    const CTX: FrameContext = FrameContext {
        fail_level: Level::Error,
        frame: 0,
    };

    #[test]
    fn silent_frame() -> anyhow::Result<()> {
        let header = FrameHeader::parse(0xFFFF_18C0)?;
        let body = vec![0u8; header.framesize];
        let mut rows = SubbandRows::default();
        Layer1Decoder::default().decode(
            &CTX,
            &FrameView {
                header: &header,
                reservoir: &[],
                body: &body,
            },
            &mut rows,
        )?;
        assert_eq!(rows.len(), 12);
        assert!(rows.rows().iter().flatten().flatten().all(|&s| s == 0.0));
        Ok(())
    }

    #[test]
    fn single_subband_values() -> anyhow::Result<()> {
        // 384 kbit/s at 44.1 kHz, mono
        let header = FrameHeader::parse(0xFFFF_C0C0)?;

        let mut w = BitWriter::default();
        w.put(1, 4); // subband 0: 2-bit samples
        for _ in 1..SBLIMIT {
            w.put(0, 4);
        }
        w.put(3, 6); // scale factor 1.0
        for n in 0..ROWS {
            w.put(n as u32 % 4, 2);
        }
        let body = w.finish(header.framesize);

        let mut rows = SubbandRows::default();
        Layer1Decoder::default().decode(
            &CTX,
            &FrameView {
                header: &header,
                reservoir: &[],
                body: &body,
            },
            &mut rows,
        )?;

        let expect = [-2.0 / 3.0, 0.0, 2.0 / 3.0, 4.0 / 3.0];
        for (n, row) in rows.rows().iter().enumerate() {
            assert!((row[0][0] - expect[n % 4]).abs() < 1e-5);
            assert!(row[0][1..].iter().all(|&s| s == 0.0));
        }
        Ok(())
    }

    #[test]
    fn joint_stereo_shares_samples() -> anyhow::Result<()> {
        // joint stereo, mode extension 0: bound at subband 4
        let header = FrameHeader::parse(0xFFFF_C040)?;
        assert_eq!(header.jsbound(), 4);

        let mut w = BitWriter::default();
        for sb in 0..SBLIMIT {
            if sb < 4 {
                w.put(0, 4);
                w.put(0, 4);
            } else {
                w.put(if sb == 10 { 2 } else { 0 }, 4);
            }
        }
        w.put(3, 6); // left scale 1.0
        w.put(6, 6); // right scale 0.5
        for _ in 0..ROWS {
            w.put(6, 3);
        }
        let body = w.finish(header.framesize);

        let mut rows = SubbandRows::default();
        Layer1Decoder::default().decode(
            &CTX,
            &FrameView {
                header: &header,
                reservoir: &[],
                body: &body,
            },
            &mut rows,
        )?;

        let row = rows.rows()[0];
        let value = (12.0 - 6.0) / 7.0;
        assert!((row[0][10] - value).abs() < 1e-5);
        assert!((row[1][10] - value * 0.5).abs() < 1e-5);
        Ok(())
    }

    #[test]
    fn forbidden_allocation() -> anyhow::Result<()> {
        let header = FrameHeader::parse(0xFFFF_C0C0)?;
        let mut body = vec![0u8; header.framesize];
        body[0] = 0xF0;
        let mut rows = SubbandRows::default();
        let err = Layer1Decoder::default()
            .decode(
                &CTX,
                &FrameView {
                    header: &header,
                    reservoir: &[],
                    body: &body,
                },
                &mut rows,
            )
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FrameError>(),
            Some(&FrameError::ForbiddenAllocation(0))
        );
        Ok(())
    }
}
