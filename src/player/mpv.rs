use super::PlayerEvent;
use anyhow::Context;
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::UnixStream,
    process::{Child, Command},
    sync::mpsc,
};

/// An mpv process reporting playback over its JSON IPC socket.
#[derive(Debug)]
pub struct MpvHandle {
    child: Child,
    socket_path: PathBuf,
    writer: tokio::sync::Mutex<tokio::io::WriteHalf<UnixStream>>,
    request_id: AtomicU64,
}

impl MpvHandle {
    pub async fn spawn(event_tx: mpsc::Sender<PlayerEvent>, audio_device: Option<&str>) -> anyhow::Result<Self> {
        let socket_path = std::env::temp_dir().join(format!("lyricsio-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        let mut cmd = Command::new("mpv");
        cmd.args(["--no-video", "--idle=yes", "--input-terminal=no", "--really-quiet"]);
        if let Some(dev) = audio_device {
            cmd.arg(format!("--audio-device={dev}"));
        }
        let child = cmd
            .arg(format!("--input-ipc-server={}", socket_path.display()))
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .spawn()
            .context("spawn mpv")?;

        // mpv creates the socket shortly after starting.
        let stream = connect_with_retry(&socket_path).await?;
        let (reader, writer) = tokio::io::split(stream);

        tokio::spawn(read_events_loop(reader, event_tx));

        let this = Self {
            child,
            socket_path,
            writer: tokio::sync::Mutex::new(writer),
            request_id: AtomicU64::new(1),
        };

        this.command(json!({"command":["request_log_messages", "warn"]}))
            .await?;
        this.command(json!({"command":["observe_property", 1, "time-pos"]}))
            .await?;
        this.command(json!({"command":["observe_property", 2, "duration"]}))
            .await?;
        this.command(json!({"command":["observe_property", 3, "pause"]}))
            .await?;
        this.command(json!({"command":["observe_property", 4, "eof-reached"]}))
            .await?;

        Ok(this)
    }

    /// Start playing a file or URL, replacing whatever is loaded.
    pub async fn load(&self, media: &str) -> anyhow::Result<()> {
        self.command(json!({"command":["loadfile", media, "replace"]})).await
    }

    async fn command(&self, mut v: serde_json::Value) -> anyhow::Result<()> {
        // Tagged requests get structured errors back on the IPC stream.
        if v.get("request_id").is_none() {
            let id = self.request_id.fetch_add(1, Ordering::Relaxed);
            if let serde_json::Value::Object(ref mut o) = v {
                o.insert("request_id".to_string(), serde_json::Value::from(id));
            }
        }
        let mut w = self.writer.lock().await;
        let mut line = serde_json::to_vec(&v).context("encode mpv json")?;
        line.push(b'\n');
        w.write_all(&line).await.context("write mpv ipc")?;
        w.flush().await.context("flush mpv ipc")?;
        Ok(())
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        let _ = self.child.start_kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

async fn connect_with_retry(path: &Path) -> anyhow::Result<UnixStream> {
    let deadline = tokio::time::Instant::now() + std::time::Duration::from_secs(5);
    loop {
        match UnixStream::connect(path).await {
            Ok(s) => return Ok(s),
            Err(e) => {
                if tokio::time::Instant::now() > deadline {
                    return Err(e).with_context(|| format!("connect to mpv ipc {}", path.display()));
                }
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
            }
        }
    }
}

async fn read_events_loop(reader: tokio::io::ReadHalf<UnixStream>, event_tx: mpsc::Sender<PlayerEvent>) {
    let mut mapper = EventMapper::default();
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let Ok(v) = serde_json::from_str::<serde_json::Value>(&line) else {
            continue;
        };
        if let Some(pe) = mapper.map(&v)
            && event_tx.send(pe).await.is_err()
        {
            break;
        }
    }
}

/// Turns mpv IPC messages into player events.
///
/// mpv announces a seek before the new position is known, so the first
/// `time-pos` change after a `seek` event is reported as [`PlayerEvent::Seek`].
#[derive(Debug, Default)]
struct EventMapper {
    seeking: bool,
}

impl EventMapper {
    fn map(&mut self, v: &serde_json::Value) -> Option<PlayerEvent> {
        // Command replies: {"request_id":..., "error":"..."}
        if v.get("request_id").is_some()
            && let Some(err) = v.get("error").and_then(|e| e.as_str())
        {
            return (err != "success").then(|| PlayerEvent::Error(format!("mpv ipc error: {err}")));
        }

        match v.get("event")?.as_str()? {
            "seek" => {
                self.seeking = true;
                None
            }
            "property-change" => match v.get("name")?.as_str()? {
                "time-pos" => {
                    // null while nothing is loaded
                    let seconds = v.get("data")?.as_f64()?;
                    if std::mem::take(&mut self.seeking) {
                        Some(PlayerEvent::Seek { seconds })
                    } else {
                        Some(PlayerEvent::Position { seconds })
                    }
                }
                "duration" => Some(PlayerEvent::Duration {
                    seconds: v.get("data")?.as_f64()?,
                }),
                "pause" => {
                    let paused = v.get("data")?.as_bool().unwrap_or(false);
                    Some(if paused { PlayerEvent::Paused } else { PlayerEvent::Started })
                }
                "eof-reached" => v
                    .get("data")?
                    .as_bool()
                    .unwrap_or(false)
                    .then_some(PlayerEvent::Ended),
                _ => None,
            },
            "end-file" => {
                let reason = v.get("reason").and_then(|x| x.as_str()).unwrap_or("");
                if reason == "error" {
                    let err = v.get("error").and_then(|x| x.as_str()).unwrap_or("unknown");
                    Some(PlayerEvent::Error(format!("mpv end-file error: {err}")))
                } else if reason == "eof" || reason == "quit" {
                    Some(PlayerEvent::Ended)
                } else {
                    None
                }
            }
            "log-message" => {
                let level = v.get("level")?.as_str().unwrap_or("info");
                let text = v.get("text")?.as_str().unwrap_or("").trim();
                ((level == "warn" || level == "error") && !text.is_empty())
                    .then(|| PlayerEvent::Error(format!("mpv {level}: {text}")))
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map_all(mapper: &mut EventMapper, lines: &[serde_json::Value]) -> Vec<PlayerEvent> {
        lines.iter().filter_map(|v| mapper.map(v)).collect()
    }

    #[test]
    fn test_position_and_seek() {
        let mut mapper = EventMapper::default();
        let events = map_all(
            &mut mapper,
            &[
                json!({"event":"property-change","id":1,"name":"time-pos","data":12.5}),
                json!({"event":"seek"}),
                json!({"event":"property-change","id":1,"name":"time-pos","data":3.0}),
                json!({"event":"property-change","id":1,"name":"time-pos","data":3.1}),
            ],
        );
        assert_eq!(
            events,
            vec![
                PlayerEvent::Position { seconds: 12.5 },
                PlayerEvent::Seek { seconds: 3.0 },
                PlayerEvent::Position { seconds: 3.1 },
            ]
        );
    }

    #[test]
    fn test_null_time_pos_is_ignored() {
        let mut mapper = EventMapper::default();
        assert_eq!(
            mapper.map(&json!({"event":"property-change","name":"time-pos","data":null})),
            None
        );
    }

    #[test]
    fn test_pause_eof_and_errors() {
        let mut mapper = EventMapper::default();
        let events = map_all(
            &mut mapper,
            &[
                json!({"event":"property-change","name":"pause","data":true}),
                json!({"event":"property-change","name":"pause","data":false}),
                json!({"event":"property-change","name":"eof-reached","data":false}),
                json!({"event":"property-change","name":"eof-reached","data":true}),
                json!({"request_id":3,"error":"success"}),
                json!({"request_id":4,"error":"property unavailable"}),
                json!({"event":"end-file","reason":"error","error":"loading failed"}),
            ],
        );
        assert_eq!(
            events,
            vec![
                PlayerEvent::Paused,
                PlayerEvent::Started,
                PlayerEvent::Ended,
                PlayerEvent::Error("mpv ipc error: property unavailable".to_string()),
                PlayerEvent::Error("mpv end-file error: loading failed".to_string()),
            ]
        );
    }
}
