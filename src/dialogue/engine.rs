//! Dialogue loop
//!
//! `Idle -> Greeting -> AwaitingInput <-> Processing -> Idle`. A failed turn
//! never ends the session: capacity failures clear the memory, every other
//! failure is answered with an apology. Only shutdown, a closed input or a
//! broken output leave the session.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::IndexedRandom;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::activation::{wait_for_activation, ActivationSource};
use super::session::Session;
use crate::agent::ConversationalAgent;
use crate::channels::{InputChannel, OutputChannel};
use crate::config::Settings;
use crate::error::{Error, Result};

/// Emitted once after the memory had to be cleared
pub const CAPACITY_APOLOGY: &str = "Apologies, the last request went over the maximum context length so I have to clear my memory. Is there anything else I can help you with?";

/// Greeting templates; `{bot}` is the bot name
pub const GREETINGS: [&str; 3] = [
    "Good evening. Can I help you with anything?",
    "{bot}, At your service.",
    "What can I do for you?",
];

/// Pause before listening again after input could not be understood
pub const TRANSCRIPTION_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Reply phrases that end a session
pub const TERMINATION_PHRASES: [&str; 3] = ["you're welcome", "you are welcome", "my pleasure"];

/// Where the loop is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueState {
    Idle,
    Greeting,
    AwaitingInput,
    Processing,
}

/// Result of one processed turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Continue,
    Terminated,
}

/// Dialogue settings
#[derive(Debug, Clone)]
pub struct DialogueConfig {
    pub bot_name: String,
    pub fallback_message: String,
    pub include_error_detail: bool,
    pub memory_token_limit: usize,
    pub retry_delay: Duration,
}

impl DialogueConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        DialogueConfig {
            bot_name: settings.general.bot_name.clone(),
            fallback_message: settings.general.fallback_message.clone(),
            include_error_detail: settings.general.include_error_detail,
            memory_token_limit: settings.model.memory_token_limit as usize,
            retry_delay: TRANSCRIPTION_RETRY_DELAY,
        }
    }

    /// Apology for a failed turn
    pub fn apology(&self, err: &Error) -> String {
        let fallback = self.fallback_message.trim_end_matches(['.', ':', ' ']);
        if self.include_error_detail {
            format!("{}: {}.", fallback, err.to_string().trim_end_matches('.'))
        } else {
            format!("{}.", fallback)
        }
    }
}

/// Whether a reply closes the conversation
pub fn is_termination(reply: &str) -> bool {
    let normalized = reply.to_lowercase().replace(['\u{2018}', '\u{2019}'], "'");
    TERMINATION_PHRASES.iter().any(|phrase| normalized.contains(phrase))
}

/// Pick a greeting at random
pub fn greeting(bot_name: &str) -> String {
    GREETINGS
        .choose(&mut rand::rng())
        .unwrap_or(&GREETINGS[0])
        .replace("{bot}", bot_name)
}

/// The control loop tying activation, channels and the agent together
pub struct DialogueLoop {
    config: DialogueConfig,
    agent: Arc<dyn ConversationalAgent>,
    input: Arc<dyn InputChannel>,
    output: Arc<dyn OutputChannel>,
    activation: Vec<Arc<dyn ActivationSource>>,
    state: DialogueState,
}

impl DialogueLoop {
    pub fn new(
        config: DialogueConfig,
        agent: Arc<dyn ConversationalAgent>,
        input: Arc<dyn InputChannel>,
        output: Arc<dyn OutputChannel>,
        activation: Vec<Arc<dyn ActivationSource>>,
    ) -> Self {
        DialogueLoop {
            config,
            agent,
            input,
            output,
            activation,
            state: DialogueState::Idle,
        }
    }

    pub fn state(&self) -> DialogueState {
        self.state
    }

    fn transition(&mut self, next: DialogueState) {
        if self.state != next {
            debug!("Dialogue state {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    /// Serve sessions until shutdown or the input closes
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        loop {
            match self.run_once(cancel).await {
                Ok(session) => {
                    info!(
                        session = %session.id,
                        turns = session.turns().len(),
                        terminated = session.is_terminated(),
                        "Session ended"
                    );
                }
                Err(e) if e.is_shutdown() => {
                    info!("Dialogue loop stopped: {}", e);
                    self.transition(DialogueState::Idle);
                    return Ok(());
                }
                Err(e) => {
                    self.transition(DialogueState::Idle);
                    return Err(e);
                }
            }
        }
    }

    /// Wait for an activation and serve one session
    pub async fn run_once(&mut self, cancel: &CancellationToken) -> Result<Session> {
        self.transition(DialogueState::Idle);
        let activation = wait_for_activation(&self.activation, cancel).await?;

        self.transition(DialogueState::Greeting);
        let mut session = Session::new(self.config.memory_token_limit);
        info!(session = %session.id, ?activation, "Session started");

        let hello = greeting(&self.config.bot_name);
        session.push_assistant(&hello);
        if let Err(e) = self.output.emit(&hello).await {
            return self.end_on_output_error(session, e);
        }

        loop {
            self.transition(DialogueState::AwaitingInput);
            let utterance = match self.input.next_utterance(cancel).await {
                Ok(text) if text.trim().is_empty() => {
                    debug!("Ignoring empty utterance");
                    continue;
                }
                Ok(text) => text,
                Err(Error::Transcription(detail)) => {
                    warn!("Could not understand input: {}", detail);
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return Err(Error::Cancelled),
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                    }
                    continue;
                }
                Err(e) if e.is_shutdown() => return Err(e),
                Err(e) => {
                    error!("Input failed, ending session: {}", e);
                    return Ok(session);
                }
            };

            self.transition(DialogueState::Processing);
            match self.process_turn(&mut session, &utterance, cancel).await {
                Ok(TurnOutcome::Continue) => {}
                Ok(TurnOutcome::Terminated) => {
                    self.transition(DialogueState::Idle);
                    return Ok(session);
                }
                Err(Error::Io(e)) => return self.end_on_output_error(session, Error::Io(e)),
                Err(e) => return Err(e),
            }
        }
    }

    fn end_on_output_error(&mut self, session: Session, err: Error) -> Result<Session> {
        if err.is_shutdown() {
            return Err(err);
        }
        error!(session = %session.id, "Output failed, ending session: {}", err);
        self.transition(DialogueState::Idle);
        Ok(session)
    }

    /// Handle one utterance: run the agent, update memory and speak the
    /// reply or an apology.
    ///
    /// Fails only on shutdown or when the output channel fails.
    pub async fn process_turn(
        &self,
        session: &mut Session,
        utterance: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let utterance = utterance.trim();
        session.push_user(utterance);
        let history = session.memory.messages();

        match self.agent.run(utterance, &history, cancel).await {
            Ok(reply) => {
                session.memory.record_exchange(utterance, reply.as_str());
                session.push_assistant(&reply);
                self.output.emit(&reply).await?;

                if is_termination(&reply) {
                    info!(session = %session.id, "Termination phrase detected");
                    session.terminate();
                    return Ok(TurnOutcome::Terminated);
                }
                Ok(TurnOutcome::Continue)
            }
            Err(Error::CapacityExceeded(detail)) => {
                warn!(session = %session.id, "Context capacity exceeded, clearing memory: {}", detail);
                session.memory.clear();
                session.push_assistant(CAPACITY_APOLOGY);
                self.output.emit(CAPACITY_APOLOGY).await?;
                Ok(TurnOutcome::Continue)
            }
            Err(e) if e.is_shutdown() => Err(e),
            Err(e) => {
                warn!(session = %session.id, "Turn failed: {}", e);
                let apology = self.config.apology(&e);
                session.memory.record_exchange(utterance, apology.as_str());
                session.push_assistant(&apology);
                self.output.emit(&apology).await?;
                Ok(TurnOutcome::Continue)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::types::Message;
    use crate::agent::Transcriber;
    use crate::channels::{AudioRecorder, TranscribingInput};
    use crate::config::test_support::sample_settings;
    use crate::config::{Secrets, ToolFlags, ToolKind};
    use crate::dialogue::activation::Activation;
    use crate::tools::test_support::offline_context;
    use crate::tools::ToolRegistry;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Script = Box<dyn Fn(usize, &str, &[Message]) -> Result<String> + Send + Sync>;

    struct StubAgent {
        calls: AtomicUsize,
        script: Script,
    }

    impl StubAgent {
        fn new(script: impl Fn(usize, &str, &[Message]) -> Result<String> + Send + Sync + 'static) -> Arc<Self> {
            Arc::new(StubAgent {
                calls: AtomicUsize::new(0),
                script: Box::new(script),
            })
        }
    }

    #[async_trait]
    impl ConversationalAgent for StubAgent {
        async fn run(
            &self,
            utterance: &str,
            history: &[Message],
            _cancel: &CancellationToken,
        ) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            (self.script)(n, utterance, history)
        }
    }

    /// Agent that answers arithmetic through the calculator tool
    struct CalculatorAgent {
        tools: ToolRegistry,
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ConversationalAgent for CalculatorAgent {
        async fn run(
            &self,
            utterance: &str,
            _history: &[Message],
            _cancel: &CancellationToken,
        ) -> Result<String> {
            let query = utterance
                .trim_start_matches("What is ")
                .trim_end_matches('?')
                .to_string();
            self.queries.lock().unwrap().push(query.clone());
            let answer = self.tools.invoke("Calculator", &query).await;
            Ok(format!("The answer is {}.", answer))
        }
    }

    struct ScriptedInput(Mutex<VecDeque<Result<String>>>);

    impl ScriptedInput {
        fn new(items: Vec<Result<String>>) -> Arc<Self> {
            Arc::new(ScriptedInput(Mutex::new(items.into())))
        }
    }

    #[async_trait]
    impl InputChannel for ScriptedInput {
        async fn next_utterance(&self, _cancel: &CancellationToken) -> Result<String> {
            self.0.lock().unwrap().pop_front().unwrap_or(Err(Error::InputClosed))
        }
    }

    /// Records emitted text; emits from index `fail_from` on fail
    #[derive(Default)]
    struct RecordingOutput {
        emitted: Mutex<Vec<String>>,
        attempts: AtomicUsize,
        fail_from: Option<usize>,
    }

    impl RecordingOutput {
        fn emitted(&self) -> Vec<String> {
            self.emitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OutputChannel for RecordingOutput {
        async fn emit(&self, text: &str) -> Result<()> {
            let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
            if self.fail_from.is_some_and(|n| attempt >= n) {
                return Err(Error::Io(std::io::Error::other("speaker unplugged")));
            }
            self.emitted.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    /// Fires at once; counts how many activations it hands out
    struct Instant {
        fired: AtomicUsize,
        discarded: AtomicUsize,
    }

    impl Instant {
        fn new() -> Arc<Self> {
            Arc::new(Instant {
                fired: AtomicUsize::new(0),
                discarded: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl ActivationSource for Instant {
        fn name(&self) -> &str {
            "instant"
        }

        async fn wait(&self, _cancel: &CancellationToken) -> Result<Activation> {
            self.fired.fetch_add(1, Ordering::SeqCst);
            Ok(Activation::Hotkey)
        }

        fn discard_pending(&self) {
            self.discarded.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Microphone that always yields a clip nobody can make out
    struct NoisyRoom {
        recordings: AtomicUsize,
    }

    #[async_trait]
    impl AudioRecorder for NoisyRoom {
        async fn record(&self, _cancel: &CancellationToken) -> Result<Vec<u8>> {
            self.recordings.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0; 16])
        }
    }

    #[async_trait]
    impl Transcriber for NoisyRoom {
        async fn transcribe(&self, _audio: Vec<u8>, _file_name: &str) -> Result<String> {
            Err(Error::Provider("unintelligible audio".to_string()))
        }
    }

    fn config() -> DialogueConfig {
        DialogueConfig {
            retry_delay: Duration::from_millis(10),
            ..DialogueConfig::from_settings(&sample_settings())
        }
    }

    fn dialogue(
        agent: Arc<dyn ConversationalAgent>,
        input: Arc<dyn InputChannel>,
        output: Arc<RecordingOutput>,
        activation: Vec<Arc<dyn ActivationSource>>,
    ) -> DialogueLoop {
        DialogueLoop::new(config(), agent, input, output, activation)
    }

    #[test]
    fn test_termination_phrases() {
        assert!(is_termination("My pleasure, sir."));
        assert!(is_termination("You\u{2019}re welcome!"));
        assert!(is_termination("YOU ARE WELCOME"));
        assert!(!is_termination("It was a pleasure to look that up."));
        assert!(!is_termination("Welcome home."));
    }

    #[test]
    fn test_greeting_choices() {
        for _ in 0..20 {
            let hello = greeting("Alfred");
            assert!(
                hello == GREETINGS[0] || hello == "Alfred, At your service." || hello == GREETINGS[2]
            );
        }
    }

    #[test]
    fn test_apology_text() {
        let mut config = config();
        let err = Error::Agent("model unavailable".to_string());
        assert_eq!(
            config.apology(&err),
            "Apologies, An error occurred while processing your request: Agent error: model unavailable."
        );

        config.include_error_detail = false;
        assert_eq!(
            config.apology(&err),
            "Apologies, An error occurred while processing your request."
        );
    }

    #[tokio::test]
    async fn test_empty_utterance_does_not_advance() {
        let agent = StubAgent::new(|_, _, _| Ok("Very good, sir.".to_string()));
        let input = ScriptedInput::new(vec![Ok("   ".to_string()), Ok(String::new())]);
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = dialogue(agent.clone(), input, output.clone(), vec![Instant::new()]);

        let err = dialogue.run_once(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, Error::InputClosed));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
        // Only the greeting was emitted.
        assert_eq!(output.emitted().len(), 1);
    }

    #[tokio::test]
    async fn test_my_pleasure_ends_session() {
        let agent = StubAgent::new(|n, _, _| match n {
            1 => Ok("The pleasure of your company is noted.".to_string()),
            _ => Ok("My pleasure, sir.".to_string()),
        });
        let input = ScriptedInput::new(vec![Ok("Noted?".to_string()), Ok("Thank you".to_string())]);
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = dialogue(agent.clone(), input, output.clone(), vec![Instant::new()]);

        let session = dialogue.run_once(&CancellationToken::new()).await.unwrap();
        assert!(session.is_terminated());
        assert_eq!(agent.calls.load(Ordering::SeqCst), 2);
        assert_eq!(dialogue.state(), DialogueState::Idle);
        assert_eq!(output.emitted().last().map(String::as_str), Some("My pleasure, sir."));
    }

    #[tokio::test]
    async fn test_capacity_failure_clears_memory() {
        let agent = StubAgent::new(|n, _, _| match n {
            3 => Err(Error::CapacityExceeded("too many tokens".to_string())),
            _ => Ok("Certainly.".to_string()),
        });
        let output = Arc::new(RecordingOutput::default());
        let dialogue = dialogue(
            agent.clone(),
            ScriptedInput::new(vec![]),
            output.clone(),
            vec![Instant::new()],
        );
        let cancel = CancellationToken::new();
        let mut session = Session::new(1500);

        for utterance in ["one", "two"] {
            dialogue.process_turn(&mut session, utterance, &cancel).await.unwrap();
        }
        assert_eq!(session.memory.len(), 4);

        let outcome = dialogue.process_turn(&mut session, "three", &cancel).await.unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);
        assert!(session.memory.is_empty());

        let apologies = output.emitted().iter().filter(|t| *t == CAPACITY_APOLOGY).count();
        assert_eq!(apologies, 1);

        // The session carries on with an empty memory.
        dialogue.process_turn(&mut session, "four", &cancel).await.unwrap();
        assert_eq!(session.memory.len(), 2);
        assert_eq!(session.turns().len(), 8);
    }

    #[tokio::test]
    async fn test_history_passed_to_agent() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder = seen.clone();
        let agent = StubAgent::new(move |_, _, history| {
            recorder.lock().unwrap().push(history.len());
            Ok("Noted.".to_string())
        });
        let output = Arc::new(RecordingOutput::default());
        let dialogue = dialogue(agent, ScriptedInput::new(vec![]), output, vec![Instant::new()]);
        let cancel = CancellationToken::new();
        let mut session = Session::new(1500);

        dialogue.process_turn(&mut session, "a", &cancel).await.unwrap();
        dialogue.process_turn(&mut session, "b", &cancel).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![0, 2]);
    }

    #[tokio::test]
    async fn test_generic_failure_apologises_once() {
        let agent = StubAgent::new(|_, _, _| Err(Error::Tool("search backend down".to_string())));
        let output = Arc::new(RecordingOutput::default());
        let dialogue = dialogue(agent, ScriptedInput::new(vec![]), output.clone(), vec![Instant::new()]);
        let mut session = Session::new(1500);

        let outcome = dialogue
            .process_turn(&mut session, "Search the news", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Continue);

        let emitted = output.emitted();
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].starts_with("Apologies, An error occurred while processing your request"));
        assert!(emitted[0].contains("search backend down"));
        assert_eq!(session.memory.len(), 2);
    }

    #[tokio::test]
    async fn test_calculator_end_to_end() {
        let mut settings = sample_settings();
        settings.tools = ToolFlags::only(ToolKind::Calculator);
        let tools = ToolRegistry::build(&settings, &Secrets::new(), &offline_context()).unwrap();
        let agent = Arc::new(CalculatorAgent {
            tools,
            queries: Mutex::new(Vec::new()),
        });
        let output = Arc::new(RecordingOutput::default());
        let dialogue = dialogue(agent.clone(), ScriptedInput::new(vec![]), output.clone(), vec![Instant::new()]);
        let mut session = Session::new(1500);

        let outcome = dialogue
            .process_turn(&mut session, "What is 2+2?", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, TurnOutcome::Continue);
        assert_eq!(*agent.queries.lock().unwrap(), vec!["2+2".to_string()]);
        assert!(output.emitted()[0].contains('4'));
        assert!(!session.is_terminated());
    }

    #[tokio::test]
    async fn test_simultaneous_activation_greets_once() {
        let hotkey = Instant::new();
        let wake_word = Instant::new();
        let agent = StubAgent::new(|_, _, _| Ok("You're welcome.".to_string()));
        let input = ScriptedInput::new(vec![Ok("Thanks".to_string())]);
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = dialogue(
            agent,
            input,
            output.clone(),
            vec![hotkey.clone(), wake_word.clone()],
        );

        let session = dialogue.run_once(&CancellationToken::new()).await.unwrap();
        assert!(session.is_terminated());

        let greetings = output
            .emitted()
            .iter()
            .filter(|t| GREETINGS.iter().any(|g| g.replace("{bot}", "Alfred") == **t))
            .count();
        assert_eq!(greetings, 1);
        assert_eq!(hotkey.discarded.load(Ordering::SeqCst), 1);
        assert_eq!(wake_word.discarded.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_transcription_failure_is_retried() {
        let agent = StubAgent::new(|_, _, _| Ok("My pleasure.".to_string()));
        let input = ScriptedInput::new(vec![
            Err(Error::Transcription("garbled".to_string())),
            Ok("Thanks".to_string()),
        ]);
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = dialogue(agent.clone(), input, output.clone(), vec![Instant::new()]);

        let session = dialogue.run_once(&CancellationToken::new()).await.unwrap();
        assert!(session.is_terminated());
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        assert_eq!(output.emitted().len(), 2);
    }

    #[tokio::test]
    async fn test_output_failure_ends_session() {
        let agent = StubAgent::new(|_, _, _| Ok("Certainly.".to_string()));
        let output = Arc::new(RecordingOutput {
            fail_from: Some(0),
            ..Default::default()
        });
        let input = ScriptedInput::new(vec![Ok("Hello".to_string())]);
        let mut dialogue = dialogue(agent.clone(), input, output, vec![Instant::new()]);

        let session = dialogue.run_once(&CancellationToken::new()).await.unwrap();
        assert!(!session.is_terminated());
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
        assert_eq!(dialogue.state(), DialogueState::Idle);
    }

    #[tokio::test]
    async fn test_run_stops_when_input_closes() {
        let agent = StubAgent::new(|_, _, _| Ok("You are welcome.".to_string()));
        let input = ScriptedInput::new(vec![Ok("Thanks".to_string())]);
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = dialogue(agent, input, output.clone(), vec![Instant::new()]);

        // First session terminates, the second finds the input closed.
        dialogue.run(&CancellationToken::new()).await.unwrap();
        assert_eq!(dialogue.state(), DialogueState::Idle);
        assert_eq!(output.emitted().len(), 3);
    }

    #[tokio::test]
    async fn test_reply_output_failure_ends_session() {
        let agent = StubAgent::new(|_, _, _| Ok("Certainly.".to_string()));
        let output = Arc::new(RecordingOutput {
            fail_from: Some(1),
            ..Default::default()
        });
        let input = ScriptedInput::new(vec![Ok("Hello".to_string()), Ok("Still there?".to_string())]);
        let mut dialogue = dialogue(agent.clone(), input, output.clone(), vec![Instant::new()]);

        let session = dialogue.run_once(&CancellationToken::new()).await.unwrap();
        assert!(!session.is_terminated());
        assert_eq!(dialogue.state(), DialogueState::Idle);
        assert_eq!(agent.calls.load(Ordering::SeqCst), 1);
        // Greeting went out, the reply did not, but the exchange is remembered.
        assert_eq!(output.emitted().len(), 1);
        assert_eq!(session.memory.len(), 2);
        assert_eq!(session.turns().last().map(|t| t.text.as_str()), Some("Certainly."));
    }

    #[tokio::test]
    async fn test_unintelligible_input_is_paced() {
        let room = Arc::new(NoisyRoom {
            recordings: AtomicUsize::new(0),
        });
        let input = Arc::new(TranscribingInput::new(room.clone(), room.clone()));
        let agent = StubAgent::new(|_, _, _| Ok("Certainly.".to_string()));
        let output = Arc::new(RecordingOutput::default());
        let mut dialogue = DialogueLoop::new(
            DialogueConfig {
                retry_delay: Duration::from_millis(100),
                ..config()
            },
            agent.clone(),
            input,
            output,
            vec![Instant::new()],
        );

        let cancel = CancellationToken::new();
        let stop = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(250)).await;
            stop.cancel();
        });

        let err = dialogue.run_once(&cancel).await.unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert_eq!(agent.calls.load(Ordering::SeqCst), 0);
        let recordings = room.recordings.load(Ordering::SeqCst);
        assert!((1..=4).contains(&recordings), "recorded {} clips", recordings);
    }
}
