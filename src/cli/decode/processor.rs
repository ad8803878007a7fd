use anyhow::Result;
use indicatif::ProgressBar;
use mpa::process::decode::{Decoder, Status};
use mpa::process::reader::Reader;
use std::sync::mpsc;

use super::handler::DecodeEvent;

pub struct ProcessFramesContext<'a> {
    pub tx: &'a mpsc::Sender<Result<DecodeEvent>>,
    pub pb_clone: &'a Option<ProgressBar>,
    pub frames_decoded: u64,
    pub clipped: u64,
    pub max_frames: Option<u64>,
    pub repeat: u32,
}

impl ProcessFramesContext<'_> {
    /// False once the receiving side has hung up.
    fn send(&self, event: Result<DecodeEvent>) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Decodes every frame the decoder can produce from its current input.
///
/// Returns `Ok(true)` when decoding should stop: end of stream, frame limit
/// reached, a decode error that was passed on, or a closed channel.
pub fn process_frames<R: Reader>(
    decoder: &mut Decoder<R>,
    ctx: &mut ProcessFramesContext,
) -> Result<bool> {
    loop {
        if ctx.max_frames.is_some_and(|max| ctx.frames_decoded >= max) {
            log::debug!("Frame limit of {} reached", ctx.frames_decoded);
            return Ok(true);
        }

        let status = match decoder.decode_frame() {
            Ok(status) => status,
            Err(e) => {
                log::error!("Decode error after {} frames: {e}", ctx.frames_decoded);
                ctx.send(Err(e.into()));
                return Ok(true);
            }
        };

        match status {
            Status::NewFormat => {
                if let Some(format) = decoder.format()? {
                    if !ctx.send(Ok(DecodeEvent::Format(format))) {
                        return Ok(true);
                    }
                }
            }
            Status::Ok => {
                ctx.frames_decoded += 1;
                ctx.clipped += decoder.clip();
                if let Some(pb) = ctx.pb_clone {
                    pb.set_position(ctx.frames_decoded);
                }

                let pcm = decoder.output();
                if pcm.is_empty() {
                    continue;
                }
                for _ in 0..ctx.repeat {
                    if !ctx.send(Ok(DecodeEvent::Pcm(pcm.to_vec()))) {
                        return Ok(true);
                    }
                }
            }
            Status::NeedMore => return Ok(false),
            Status::Done => return Ok(true),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mpa::process::EXAMPLE_DATA;
    use mpa::process::decode::FeedDecoder;
    use mpa::process::params::DecoderParams;

    fn run(max_frames: Option<u64>, repeat: u32) -> anyhow::Result<(Vec<DecodeEvent>, u64)> {
        let (tx, rx) = mpsc::channel();
        let pb = None;
        let mut ctx = ProcessFramesContext {
            tx: &tx,
            pb_clone: &pb,
            frames_decoded: 0,
            clipped: 0,
            max_frames,
            repeat,
        };

        let mut decoder = FeedDecoder::new_feed(DecoderParams::default())?;
        // the second frame is incomplete
        decoder.feed(&EXAMPLE_DATA[..60]);
        if !process_frames(&mut decoder, &mut ctx)? {
            decoder.feed(&EXAMPLE_DATA[60..]);
            decoder.finish();
            assert!(process_frames(&mut decoder, &mut ctx)?);
        }

        let frames = ctx.frames_decoded;
        drop(tx);
        let events = rx.iter().collect::<Result<Vec<_>>>()?;
        Ok((events, frames))
    }

    #[test]
    fn events_follow_the_stream() -> anyhow::Result<()> {
        let (events, frames) = run(None, 1)?;
        assert_eq!(frames, 3);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], DecodeEvent::Format(f) if f.rate == 32000 && f.channels == 1));
        assert!(events[1..].iter().all(|e| matches!(e, DecodeEvent::Pcm(p) if p.len() == 768)));
        Ok(())
    }

    #[test]
    fn frame_limit_and_repeat() -> anyhow::Result<()> {
        let (events, frames) = run(Some(1), 2)?;
        assert_eq!(frames, 1);
        // format, then the first frame twice
        assert_eq!(events.len(), 3);
        Ok(())
    }
}
