//! Layer II: table driven allocations, scale factor selection info and
//! grouped quantization.
//!
//! A frame holds 12 granules of 3 samples per subband. Each subband carries up
//! to three scale factors, one per 4 granules, transmitted according to its
//! 2-bit SCFSI pattern.

use anyhow::{Result, bail};

use crate::process::layer::tables::{QuantClass, SubbandAlloc, allocations, requantize, scale_factors, select_table};
use crate::process::layer::{FrameContext, FrameView, LayerDecoder, SubbandRows, check_crc};
use crate::process::synth::{Real, SBLIMIT};
use crate::utils::bitstream_io::BsIoSliceReader;
use crate::utils::errors::FrameError;

const GRANULES: usize = 12;

#[derive(Debug, Clone)]
pub struct Layer2Decoder {
    scf: [Real; 64],
    tables: [Vec<SubbandAlloc>; 5],
}

impl Default for Layer2Decoder {
    fn default() -> Self {
        Self {
            scf: scale_factors(),
            tables: std::array::from_fn(allocations),
        }
    }
}

fn read_triple(reader: &mut BsIoSliceReader, class: QuantClass) -> Result<[u32; 3]> {
    if class.grouped {
        let mut code: u32 = reader.get_n(class.bits)?;
        let mut out = [0u32; 3];
        for v in out.iter_mut() {
            *v = code % class.levels;
            code /= class.levels;
        }
        Ok(out)
    } else {
        Ok([
            reader.get_n(class.bits)?,
            reader.get_n(class.bits)?,
            reader.get_n(class.bits)?,
        ])
    }
}

impl LayerDecoder for Layer2Decoder {
    fn decode(
        &mut self,
        _ctx: &FrameContext,
        frame: &FrameView,
        rows: &mut SubbandRows,
    ) -> Result<()> {
        let header = frame.header;
        let channels = header.channels();
        let table = &self.tables[select_table(header)];
        let sblimit = table.len();
        let jsbound = header.jsbound().min(sblimit);

        let mut reader = BsIoSliceReader::from_slice(frame.body);
        if header.protected {
            reader.skip_n(16)?;
        }

        let mut alloc = [[0u8; SBLIMIT]; 2];
        for (sb, entry) in table.iter().enumerate() {
            for ch in 0..channels {
                alloc[ch][sb] = if sb >= jsbound && ch == 1 {
                    alloc[0][sb]
                } else {
                    reader.get_n(entry.nbal)?
                };
            }
        }

        let mut scfsi = [[0u8; SBLIMIT]; 2];
        for sb in 0..sblimit {
            for ch in 0..channels {
                if alloc[ch][sb] != 0 {
                    scfsi[ch][sb] = reader.get_n(2)?;
                }
            }
        }

        let protected_bits = reader.position()? - if header.protected { 16 } else { 0 };
        check_crc(header, &mut reader, protected_bits)?;

        let mut scale = [[[0.0; 3]; SBLIMIT]; 2];
        for sb in 0..sblimit {
            for ch in 0..channels {
                if alloc[ch][sb] == 0 {
                    continue;
                }
                let mut read = || -> Result<Real> { Ok(self.scf[reader.get_n::<u8>(6)? as usize]) };
                scale[ch][sb] = match scfsi[ch][sb] {
                    0 => [read()?, read()?, read()?],
                    1 => {
                        let a = read()?;
                        [a, a, read()?]
                    }
                    2 => {
                        let a = read()?;
                        [a, a, a]
                    }
                    _ => {
                        let a = read()?;
                        let b = read()?;
                        [a, b, b]
                    }
                };
            }
        }

        for gr in 0..GRANULES {
            let part = gr / 4;
            let first = rows.len();
            rows.push_silence(3);

            for (sb, entry) in table.iter().enumerate() {
                let mut codes = [0u32; 3];
                let mut levels = 0;
                for ch in 0..channels {
                    let a = alloc[ch][sb];
                    if a == 0 {
                        continue;
                    }
                    let Some(class) = entry.class(a) else {
                        bail!(FrameError::ForbiddenAllocation(sb));
                    };
                    if !(sb >= jsbound && ch == 1) {
                        codes = read_triple(&mut reader, class)?;
                        levels = class.levels;
                    }
                    let factor = scale[ch][sb][part];
                    for (i, &code) in codes.iter().enumerate() {
                        rows.row_mut(first + i)[ch][sb] = requantize(code, levels) * factor;
                    }
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

    fn decode(header: &FrameHeader, body: &[u8]) -> Result<SubbandRows> {
        let mut rows = SubbandRows::default();
        Layer2Decoder::default().decode(
            &CTX,
            &FrameView {
                header,
                reservoir: &[],
                body,
            },
            &mut rows,
        )?;
        Ok(rows)
    }

    #[test]
    fn silent_frame() -> anyhow::Result<()> {
        let header = FrameHeader::parse(0xFFFD_A000)?;
        let rows = decode(&header, &vec![0u8; header.framesize])?;
        assert_eq!(rows.len(), 36);
        assert!(rows.rows().iter().flatten().flatten().all(|&s| s == 0.0));
        Ok(())
    }

    #[test]
    fn grouped_samples_and_scfsi() -> anyhow::Result<()> {
        // 192 kbit/s mono at 48 kHz uses the 27-subband table
        let header = FrameHeader::parse(0xFFFD_A4C0)?;
        assert_eq!(select_table(&header), 0);

        let mut w = BitWriter::default();
        // subband 0: allocation 1 is the grouped 3-level class
        w.put(1, 4);
        for sb in 1..27 {
            w.put(0, if sb < 11 { 4 } else if sb < 23 { 3 } else { 2 });
        }
        w.put(1, 2); // scfsi: first factor for parts 0 and 1
        w.put(3, 6); // 1.0
        w.put(6, 6); // 0.5
        for _ in 0..GRANULES {
            // samples (2, 1, 0): 2 + 1*3 + 0*9
            w.put(5, 5);
        }
        let body = w.finish(header.framesize);

        let rows = decode(&header, &body)?;
        assert_eq!(rows.len(), 36);
        let expect = [2.0 / 3.0, 0.0, -2.0 / 3.0];
        for (n, row) in rows.rows().iter().enumerate() {
            let factor = if n < 24 { 1.0 } else { 0.5 };
            assert!(
                (row[0][0] - expect[n % 3] * factor).abs() < 1e-5,
                "row {n}: {}",
                row[0][0]
            );
        }
        Ok(())
    }

    #[test]
    fn truncated_body_fails() -> anyhow::Result<()> {
        let header = FrameHeader::parse(0xFFFD_A4C0)?;
        let mut body = vec![0xFFu8; 8];
        body[0] = 0x10;
        assert!(decode(&header, &body).is_err());
        Ok(())
    }
}
