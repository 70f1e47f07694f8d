//! Voice channel
//!
//! Input records a clip with an external command and hands it to a
//! transcriber. Output prints the reply and speaks it with the configured
//! speech program.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::console::ConsoleOutput;
use super::{InputChannel, OutputChannel};
use crate::agent::Transcriber;
use crate::config::VoiceSettings;
use crate::error::{Error, Result};

/// Records one audio clip
#[async_trait]
pub trait AudioRecorder: Send + Sync {
    /// Record a WAV clip
    async fn record(&self, cancel: &CancellationToken) -> Result<Vec<u8>>;
}

/// Recorder driven by a command template such as
/// `rec -q -c 1 -r 16000 {output} trim 0 {seconds}`
#[derive(Debug, Clone)]
pub struct CommandRecorder {
    template: String,
    seconds: u64,
}

impl CommandRecorder {
    pub fn new(template: impl Into<String>, seconds: u64) -> Self {
        CommandRecorder {
            template: template.into(),
            seconds,
        }
    }

    pub fn from_settings(settings: &VoiceSettings) -> Self {
        Self::new(settings.record_command.clone(), settings.record_seconds)
    }

    /// Program and arguments for one recording into `output`
    fn command_line(&self, output: &str) -> Result<(String, Vec<String>)> {
        let seconds = self.seconds.to_string();
        let mut parts = self.template.split_whitespace().map(|part| {
            part.replace("{output}", output)
                .replace("{seconds}", &seconds)
        });
        let program = parts
            .next()
            .ok_or_else(|| Error::Config("record_command is empty".to_string()))?;
        Ok((program, parts.collect()))
    }
}

#[async_trait]
impl AudioRecorder for CommandRecorder {
    async fn record(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let clip = tempfile::Builder::new()
            .prefix("alfred-")
            .suffix(".wav")
            .tempfile()?;
        let output = clip.path().to_string_lossy().into_owned();
        let (program, args) = self.command_line(&output)?;

        debug!("Recording {}s clip with {}", self.seconds, program);
        let mut child = Command::new(&program).args(&args).kill_on_drop(true).spawn()?;

        let status = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            status = child.wait() => status?,
        };
        if !status.success() {
            return Err(Error::Transcription(format!(
                "{} exited with {}",
                program, status
            )));
        }

        let audio = tokio::fs::read(clip.path()).await?;
        if audio.is_empty() {
            return Err(Error::Transcription("Recorded clip is empty".to_string()));
        }
        Ok(audio)
    }
}

/// Spoken input: record, then transcribe
pub struct TranscribingInput {
    recorder: Arc<dyn AudioRecorder>,
    transcriber: Arc<dyn Transcriber>,
}

impl TranscribingInput {
    pub fn new(recorder: Arc<dyn AudioRecorder>, transcriber: Arc<dyn Transcriber>) -> Self {
        TranscribingInput {
            recorder,
            transcriber,
        }
    }

    /// Record one clip and return its text
    pub async fn listen(&self, cancel: &CancellationToken) -> Result<String> {
        let audio = self.recorder.record(cancel).await?;

        let text = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            text = self.transcriber.transcribe(audio, "utterance.wav") => text,
        };

        match text {
            Ok(text) => {
                debug!("Heard: {}", text);
                Ok(text)
            }
            Err(e) if e.is_shutdown() => Err(e),
            Err(e) => Err(Error::Transcription(e.to_string())),
        }
    }
}

#[async_trait]
impl InputChannel for TranscribingInput {
    async fn next_utterance(&self, cancel: &CancellationToken) -> Result<String> {
        self.listen(cancel).await
    }
}

/// Prints and speaks replies
pub struct SpeechOutput {
    speak_command: String,
    voice: String,
    transcript: ConsoleOutput,
}

impl SpeechOutput {
    pub fn new(settings: &VoiceSettings, transcript: ConsoleOutput) -> Self {
        SpeechOutput {
            speak_command: settings.speak_command.clone(),
            voice: settings.voice.clone(),
            transcript,
        }
    }

    fn args(&self, text: &str) -> Vec<String> {
        let mut args = Vec::new();
        if !self.voice.trim().is_empty() {
            args.push("-v".to_string());
            args.push(self.voice.trim().to_string());
        }
        args.push(text.to_string());
        args
    }
}

#[async_trait]
impl OutputChannel for SpeechOutput {
    async fn emit(&self, text: &str) -> Result<()> {
        self.transcript.write_line(text)?;

        let status = Command::new(&self.speak_command)
            .args(self.args(text))
            .status()
            .await?;
        if !status.success() {
            return Err(Error::Io(std::io::Error::other(format!(
                "{} exited with {}",
                self.speak_command, status
            ))));
        }
        info!("Spoke {} chars", text.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedRecorder;

    #[async_trait]
    impl AudioRecorder for FixedRecorder {
        async fn record(&self, _cancel: &CancellationToken) -> Result<Vec<u8>> {
            Ok(vec![1, 2, 3])
        }
    }

    struct ScriptedTranscriber(Result<String>);

    #[async_trait]
    impl Transcriber for ScriptedTranscriber {
        async fn transcribe(&self, audio: Vec<u8>, _file_name: &str) -> Result<String> {
            assert_eq!(audio, vec![1, 2, 3]);
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(Error::Provider(e.to_string())),
            }
        }
    }

    #[test]
    fn test_command_line_substitution() {
        let recorder = CommandRecorder::new("rec -q {output} trim 0 {seconds}", 4);
        let (program, args) = recorder.command_line("/tmp/clip.wav").unwrap();
        assert_eq!(program, "rec");
        assert_eq!(args, vec!["-q", "/tmp/clip.wav", "trim", "0", "4"]);

        assert!(CommandRecorder::new("  ", 4).command_line("x").is_err());
    }

    #[tokio::test]
    async fn test_transcribed_text() {
        let input = TranscribingInput::new(
            Arc::new(FixedRecorder),
            Arc::new(ScriptedTranscriber(Ok("Hey Alfred".to_string()))),
        );
        let text = input.next_utterance(&CancellationToken::new()).await.unwrap();
        assert_eq!(text, "Hey Alfred");
    }

    #[tokio::test]
    async fn test_transcriber_failure_is_transcription_error() {
        let input = TranscribingInput::new(
            Arc::new(FixedRecorder),
            Arc::new(ScriptedTranscriber(Err(Error::Provider("bad audio".into())))),
        );
        let err = input.next_utterance(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::Transcription(_)));
    }

    #[test]
    fn test_speech_args() {
        let settings = VoiceSettings {
            voice: "Daniel".to_string(),
            ..VoiceSettings::default()
        };
        let output = SpeechOutput::new(&settings, ConsoleOutput::with_writer("Alfred", Box::new(std::io::sink())));
        assert_eq!(output.args("Hello"), vec!["-v", "Daniel", "Hello"]);

        let output = SpeechOutput::new(
            &VoiceSettings::default(),
            ConsoleOutput::with_writer("Alfred", Box::new(std::io::sink())),
        );
        assert_eq!(output.args("Hello"), vec!["Hello"]);
    }
}
