//! Video snapshot extraction through ffmpeg.
//!
//! The processor never reads the video itself. It asks the store for a URL
//! the ffmpeg process can open (a presigned URL for remote backends, a plain
//! path for local ones) and pipes a single frame back over stdout.

use std::collections::BTreeMap;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use pictor_core::{AppError, AppResult};
use pictor_storage::BufferStore;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

use crate::chain::split_kv;
use crate::processor::{ProcessData, Processor, ProcessResponse};

/// Largest snapshot ffmpeg may hand back.
const MAX_OUTPUT_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 16 * 1024;

struct SnapshotOpts {
    /// Seek position in seconds.
    seek: f64,
    /// ffmpeg video codec name.
    codec: &'static str,
    content_type: &'static str,
}

fn parse_snapshot(params: &[&str]) -> AppResult<SnapshotOpts> {
    let mut opts = SnapshotOpts {
        seek: 1.0,
        codec: "mjpeg",
        content_type: "image/jpeg",
    };
    for param in params {
        if *param == "snapshot" || param.is_empty() {
            continue;
        }
        match split_kv(param) {
            ("t", Some(v)) if !v.is_empty() => {
                let ms: f64 = v.parse().map_err(|_| {
                    AppError::invalid_argument(format!("invalid video snapshot time: \"{v}\""))
                })?;
                if !ms.is_finite() || ms < 0.0 {
                    return Err(AppError::invalid_argument(format!(
                        "invalid video snapshot time: \"{v}\""
                    )));
                }
                opts.seek = ms / 1000.0;
            }
            ("f", Some(v)) if !v.is_empty() => match v {
                "jpg" => {
                    opts.codec = "mjpeg";
                    opts.content_type = "image/jpeg";
                }
                "png" => {
                    opts.codec = "png";
                    opts.content_type = "image/png";
                }
                _ => {
                    return Err(AppError::invalid_argument(format!(
                        "unknown video snapshot format: \"{v}\", must be jpg or png"
                    )))
                }
            },
            ("m", Some(v)) if !v.is_empty() => {
                if v != "fast" {
                    return Err(AppError::invalid_argument(format!(
                        "unknown video snapshot mode: \"{v}\", must be fast"
                    )));
                }
            }
            // Bare keys keep their defaults.
            ("t" | "f" | "m", _) => {}
            (k, _) => {
                return Err(AppError::invalid_argument(format!(
                    "unknown video snapshot param: \"{k}\""
                )))
            }
        }
    }
    Ok(opts)
}

pub struct VideoProcessor {
    ffmpeg_path: String,
}

impl VideoProcessor {
    pub fn new(ffmpeg_path: String) -> Self {
        Self { ffmpeg_path }
    }

    async fn screenshot(&self, url: &str, opts: &SnapshotOpts) -> AppResult<Bytes> {
        let mut child = Command::new(&self.ffmpeg_path)
            .args([
                "-i",
                url,
                "-ss",
                &opts.seek.to_string(),
                "-vframes",
                "1",
                "-c:v",
                opts.codec,
                "-f",
                "image2pipe",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                AppError::Internal(format!("failed to spawn {}: {e}", self.ffmpeg_path))
            })?;

        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| AppError::Internal("ffmpeg stdout not captured".to_string()))?;

        let mut out = Vec::new();
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = stdout.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            if out.len() + n > MAX_OUTPUT_BYTES {
                let _ = child.start_kill();
                let _ = child.wait().await;
                return Err(AppError::Internal(
                    "video snapshot exceeds max buffer size".to_string(),
                ));
            }
            out.extend_from_slice(&buf[..n]);
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(AppError::Internal(format!("ffmpeg exited with {status}")));
        }
        Ok(Bytes::from(out))
    }
}

#[async_trait]
impl Processor for VideoProcessor {
    fn name(&self) -> &'static str {
        "video"
    }

    async fn execute(
        &self,
        uri: &str,
        actions: &[String],
        store: Arc<dyn BufferStore>,
    ) -> AppResult<ProcessResponse> {
        if actions.len() != 2 {
            return Err(AppError::invalid_argument("Invalid video request!"));
        }
        let params: Vec<&str> = actions[1].split(',').collect();
        if params.first().copied() != Some("snapshot") {
            return Err(AppError::invalid_argument("Invalid video action name!"));
        }
        if params.len() != 4 {
            return Err(AppError::invalid_argument(
                "Invalid video request! expected snapshot,t_<ms>,f_<format>,m_fast",
            ));
        }
        let opts = parse_snapshot(&params)?;

        let url = store.url(uri).await?;
        debug!(uri = %uri, seek = opts.seek, codec = opts.codec, "extracting video snapshot");
        let data = self.screenshot(&url, &opts).await?;

        Ok(ProcessResponse {
            data: ProcessData::Image(data),
            content_type: opts.content_type.to_string(),
            headers: BTreeMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pictor_storage::MemBufferStore;

    fn chain(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_snapshot_defaults() {
        let opts = parse_snapshot(&["snapshot", "t_1000", "f_jpg", "m_fast"]).unwrap();
        assert_eq!(opts.seek, 1.0);
        assert_eq!(opts.codec, "mjpeg");
        assert_eq!(opts.content_type, "image/jpeg");
    }

    #[test]
    fn test_parse_snapshot_png_and_seek() {
        let opts = parse_snapshot(&["snapshot", "t_2500", "f_png", "m_fast"]).unwrap();
        assert_eq!(opts.seek, 2.5);
        assert_eq!(opts.codec, "png");
        assert_eq!(opts.content_type, "image/png");
    }

    #[test]
    fn test_parse_snapshot_bare_keys_keep_defaults() {
        let opts = parse_snapshot(&["snapshot", "t", "f", "m"]).unwrap();
        assert_eq!(opts.seek, 1.0);
        assert_eq!(opts.codec, "mjpeg");
    }

    #[test]
    fn test_parse_snapshot_rejects_bad_values() {
        assert!(parse_snapshot(&["snapshot", "f_bmp"]).is_err());
        assert!(parse_snapshot(&["snapshot", "m_slow"]).is_err());
        assert!(parse_snapshot(&["snapshot", "t_abc"]).is_err());
        assert!(parse_snapshot(&["snapshot", "t_-5"]).is_err());
        assert!(parse_snapshot(&["snapshot", "w_100"]).is_err());
    }

    #[tokio::test]
    async fn test_execute_rejects_malformed_chains() {
        let processor = VideoProcessor::new("ffmpeg".to_string());
        let store: Arc<dyn BufferStore> = Arc::new(MemBufferStore::new());

        let err = processor
            .execute("a.mp4", &chain(&["video"]), store.clone())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "InvalidArgument: Invalid video request!");

        let err = processor
            .execute("a.mp4", &chain(&["video", "resize,w_10"]), store.clone())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "InvalidArgument: Invalid video action name!");

        let err = processor
            .execute("a.mp4", &chain(&["video", "snapshot,t_1000"]), store)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Invalid video request!"));
    }
}
