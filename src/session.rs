// Editing session: the review/rewrite loop over an outline
//
// Block state lives behind a mutex that is never held across an agent call.
// Each operation marks the block busy, releases the lock, awaits the agent,
// then records the outcome. Every failure is written into the block or
// comment state before it is returned, so nothing is left loading.
//
// Ids are reused once a block is removed, so each status carries an epoch
// taken when the block was created. An outcome is only recorded if the block
// still holds the epoch it had when the call began.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::agent::{AgentConfig, AgentError, AgentRole};
use crate::context::AppContext;
use crate::document::{self, Comment, CommentStatus, ContentBlock, DocumentBrief};
use crate::errors::StoreError;
use crate::store::Namespace;

const SESSION_KEY: &str = "session";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("No section with id {0}")]
    UnknownBlock(u32),

    #[error("No comment with id {0}")]
    UnknownComment(String),

    #[error("Section {0} is already being reviewed")]
    ReviewInProgress(u32),

    #[error("Section {0} is already being written")]
    GenerationInProgress(u32),

    #[error("Comment {0} is still loading")]
    CommentBusy(String),

    #[error("Comment {0} has no finished review to apply")]
    CommentNotReady(String),

    #[error("No {0} agent assigned")]
    NoAgent(AgentRole),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Reviewing,
    Completed,
    Error,
}

/// Orchestration state of one block, separate from its comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockStatus {
    pub review_status: ReviewStatus,
    pub is_initial_review: bool,
    /// Writer-side generation in flight
    pub is_loading: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip)]
    epoch: u64,
}

impl Default for BlockStatus {
    fn default() -> Self {
        Self {
            review_status: ReviewStatus::Pending,
            is_initial_review: true,
            is_loading: false,
            error: None,
            epoch: 0,
        }
    }
}

/// Everything the session persists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub brief: DocumentBrief,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub blocks: Vec<ContentBlock>,
    #[serde(default)]
    pub status: BTreeMap<u32, BlockStatus>,
    /// Document-wide defaults; a block's own snapshot takes precedence
    #[serde(default)]
    pub writer: Option<AgentConfig>,
    #[serde(default)]
    pub reviewer: Option<AgentConfig>,
    #[serde(skip)]
    next_epoch: u64,
}

impl SessionState {
    fn block(&self, id: u32) -> Result<&ContentBlock, SessionError> {
        self.blocks
            .iter()
            .find(|b| b.id == id)
            .ok_or(SessionError::UnknownBlock(id))
    }

    fn block_mut(&mut self, id: u32) -> Result<&mut ContentBlock, SessionError> {
        self.blocks
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(SessionError::UnknownBlock(id))
    }

    /// Fresh status for a block that just came into existence.
    fn fresh_status(&mut self) -> BlockStatus {
        self.next_epoch += 1;
        BlockStatus {
            epoch: self.next_epoch,
            ..BlockStatus::default()
        }
    }

    /// Status of an existing block, created on first use.
    fn status_mut(&mut self, id: u32) -> Result<&mut BlockStatus, SessionError> {
        self.block(id)?;
        Ok(self.status.entry(id).or_default())
    }

    /// Status of `id`, only while it is still the block an operation started on.
    fn current_status(&mut self, id: u32, epoch: u64) -> Option<&mut BlockStatus> {
        self.status.get_mut(&id).filter(|status| status.epoch == epoch)
    }

    fn agent_for(&self, block: &ContentBlock, role: AgentRole) -> Result<AgentConfig, SessionError> {
        let assigned = match role {
            AgentRole::ContentWriter => block.writer.as_ref().or(self.writer.as_ref()),
            AgentRole::ContentReviewer => block.reviewer.as_ref().or(self.reviewer.as_ref()),
        };
        assigned.cloned().ok_or(SessionError::NoAgent(role))
    }

    /// Anything in flight when the state was saved did not finish.
    fn settle_interrupted(&mut self) {
        for status in self.status.values_mut() {
            status.is_loading = false;
            if status.review_status == ReviewStatus::Reviewing {
                status.review_status = ReviewStatus::Error;
                status.error = Some("Interrupted before completion".to_string());
            }
        }
        for block in &mut self.blocks {
            for comment in &mut block.comments {
                if comment.status == CommentStatus::Loading {
                    comment.fail("Interrupted before completion");
                }
            }
        }
    }
}

pub struct EditingSession {
    ctx: Arc<AppContext>,
    state: Mutex<SessionState>,
}

impl EditingSession {
    /// New session using the first writer and reviewer of the agent list.
    pub fn new(ctx: Arc<AppContext>, brief: DocumentBrief) -> Self {
        let state = SessionState {
            brief,
            writer: ctx.agents().first_with_role(AgentRole::ContentWriter),
            reviewer: ctx.agents().first_with_role(AgentRole::ContentReviewer),
            ..Default::default()
        };
        Self {
            ctx,
            state: Mutex::new(state),
        }
    }

    /// Reopen the saved session, if any.
    pub fn restore(ctx: Arc<AppContext>) -> Result<Option<Self>, SessionError> {
        let Some(mut state) = ctx
            .store()
            .load_as::<SessionState>(Namespace::Editor, SESSION_KEY)?
        else {
            return Ok(None);
        };
        state.settle_interrupted();
        Ok(Some(Self {
            ctx,
            state: Mutex::new(state),
        }))
    }

    pub fn save(&self) -> Result<(), SessionError> {
        let snapshot = self.snapshot();
        self.ctx
            .store()
            .save_as(Namespace::Editor, SESSION_KEY, &snapshot)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    pub fn blocks(&self) -> Vec<ContentBlock> {
        self.lock().blocks.clone()
    }

    pub fn block(&self, id: u32) -> Option<ContentBlock> {
        self.lock().block(id).ok().cloned()
    }

    pub fn status(&self, id: u32) -> BlockStatus {
        self.lock().status.get(&id).cloned().unwrap_or_default()
    }

    pub fn set_title(&self, title: impl Into<String>) {
        self.lock().title = Some(title.into());
    }

    /// Replace the document-wide writer/reviewer pair.
    pub fn set_default_agents(&self, writer: Option<AgentConfig>, reviewer: Option<AgentConfig>) {
        let mut state = self.lock();
        state.writer = writer;
        state.reviewer = reviewer;
    }

    /// Ask the writer for an outline; it replaces the current one.
    ///
    /// Returns the number of sections (zero when the answer was unreadable).
    pub async fn generate_outline(&self, extra_context: Option<&str>) -> Result<usize, SessionError> {
        let (brief, writer) = {
            let state = self.lock();
            let writer = state.writer.clone().ok_or(SessionError::NoAgent(AgentRole::ContentWriter))?;
            (state.brief.clone(), writer)
        };

        let blocks = self
            .ctx
            .agent(writer)
            .generate_structured_blocks(&brief, extra_context)
            .await?;

        let mut state = self.lock();
        let mut status = BTreeMap::new();
        for block in &blocks {
            status.insert(block.id, state.fresh_status());
        }
        state.status = status;
        state.blocks = blocks;
        Ok(state.blocks.len())
    }

    /// Append a section with the next free id.
    pub fn add_block(&self, title: impl Into<String>, description: impl Into<String>) -> u32 {
        let mut state = self.lock();
        let id = state.blocks.iter().map(|b| b.id).max().unwrap_or(0) + 1;
        state.blocks.push(ContentBlock::new(id, title, description));
        let status = state.fresh_status();
        state.status.insert(id, status);
        id
    }

    /// Remove a section; the others keep their order.
    pub fn remove_block(&self, id: u32) -> Result<ContentBlock, SessionError> {
        let mut state = self.lock();
        let pos = state
            .blocks
            .iter()
            .position(|b| b.id == id)
            .ok_or(SessionError::UnknownBlock(id))?;
        state.status.remove(&id);
        Ok(state.blocks.remove(pos))
    }

    /// Edit a section by hand.
    pub fn update_block<F>(&self, id: u32, edit: F) -> Result<(), SessionError>
    where
        F: FnOnce(&mut ContentBlock),
    {
        let mut state = self.lock();
        let block = state.block_mut(id)?;
        edit(block);
        block.id = id;
        Ok(())
    }

    /// Give a section its own writer and/or reviewer (copied, not shared).
    pub fn assign_agents(
        &self,
        id: u32,
        writer: Option<AgentConfig>,
        reviewer: Option<AgentConfig>,
    ) -> Result<(), SessionError> {
        let mut state = self.lock();
        let block = state.block_mut(id)?;
        if writer.is_some() {
            block.writer = writer;
        }
        if reviewer.is_some() {
            block.reviewer = reviewer;
        }
        Ok(())
    }

    /// Write the body of a section with its writer.
    pub async fn generate_content(&self, id: u32) -> Result<String, SessionError> {
        let (brief, outline, block, writer, epoch) = {
            let mut state = self.lock();
            let block = state.block(id)?.clone();
            let writer = state.agent_for(&block, AgentRole::ContentWriter)?;
            let epoch = Self::begin_generation(&mut state, id)?;
            (state.brief.clone(), state.blocks.clone(), block, writer, epoch)
        };

        let result = self.ctx.agent(writer).expand(&brief, &outline, &block).await;

        let mut state = self.lock();
        let Some(status) = state.current_status(id, epoch) else {
            tracing::debug!("Section {} was replaced while it was being written", id);
            return Err(SessionError::UnknownBlock(id));
        };
        status.is_loading = false;
        match result {
            Ok(content) => {
                state.block_mut(id)?.content = content.clone();
                Ok(content)
            }
            Err(e) => {
                tracing::warn!("Generating section {} failed: {}", id, e);
                status.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Mark the writer busy; returns the block's epoch.
    fn begin_generation(state: &mut SessionState, id: u32) -> Result<u64, SessionError> {
        let status = state.status_mut(id)?;
        if status.is_loading {
            return Err(SessionError::GenerationInProgress(id));
        }
        status.is_loading = true;
        status.error = None;
        Ok(status.epoch)
    }

    /// Start a new review of a section; returns the new comment's id.
    pub async fn request_review(
        &self,
        id: u32,
        instructions: Option<&str>,
    ) -> Result<String, SessionError> {
        let (brief, block, reviewer, comment_id, epoch) = {
            let mut state = self.lock();
            let block = state.block(id)?.clone();
            let reviewer = state.agent_for(&block, AgentRole::ContentReviewer)?;
            let epoch = Self::begin_review(&mut state, id)?;

            let comment = Comment::pending(reviewer.name.clone());
            let comment_id = comment.id.clone();
            state.block_mut(id)?.comments.push(comment);
            (state.brief.clone(), block, reviewer, comment_id, epoch)
        };

        self.run_review(id, epoch, &comment_id, brief, block, reviewer, instructions)
            .await?;
        Ok(comment_id)
    }

    /// Re-run the review behind an existing comment, overwriting its text.
    pub async fn retry_review(
        &self,
        id: u32,
        comment_id: &str,
        instructions: Option<&str>,
    ) -> Result<(), SessionError> {
        let (brief, block, reviewer, epoch) = {
            let mut state = self.lock();
            let block = state.block(id)?.clone();
            let reviewer = state.agent_for(&block, AgentRole::ContentReviewer)?;
            match block.comment(comment_id) {
                None => return Err(SessionError::UnknownComment(comment_id.to_string())),
                Some(c) if c.status == CommentStatus::Loading => {
                    return Err(SessionError::CommentBusy(comment_id.to_string()))
                }
                Some(_) => {}
            }
            let epoch = Self::begin_review(&mut state, id)?;
            if let Some(comment) = state.block_mut(id)?.comment_mut(comment_id) {
                comment.begin();
            }
            (state.brief.clone(), block, reviewer, epoch)
        };

        self.run_review(id, epoch, comment_id, brief, block, reviewer, instructions)
            .await
    }

    /// Mark the block under review; returns its epoch.
    fn begin_review(state: &mut SessionState, id: u32) -> Result<u64, SessionError> {
        let status = state.status_mut(id)?;
        if status.review_status == ReviewStatus::Reviewing {
            return Err(SessionError::ReviewInProgress(id));
        }
        status.review_status = ReviewStatus::Reviewing;
        status.error = None;
        Ok(status.epoch)
    }

    #[allow(clippy::too_many_arguments)]
    async fn run_review(
        &self,
        id: u32,
        epoch: u64,
        comment_id: &str,
        brief: DocumentBrief,
        block: ContentBlock,
        reviewer: AgentConfig,
        instructions: Option<&str>,
    ) -> Result<(), SessionError> {
        let result = self
            .ctx
            .agent(reviewer)
            .generate_review(&brief, &block, instructions)
            .await;

        let mut state = self.lock();
        if state.current_status(id, epoch).is_none() {
            tracing::debug!("Section {} was replaced while it was being reviewed", id);
            return Err(SessionError::UnknownBlock(id));
        }

        let (outcome, result) = match result {
            Ok(text) => (Ok(text), Ok(())),
            Err(e) => {
                tracing::warn!("Review of section {} failed: {}", id, e);
                (Err(e.to_string()), Err(SessionError::from(e)))
            }
        };

        if let Some(status) = state.current_status(id, epoch) {
            match &outcome {
                Ok(_) => {
                    status.review_status = ReviewStatus::Completed;
                    status.is_initial_review = false;
                }
                Err(message) => {
                    status.review_status = ReviewStatus::Error;
                    status.error = Some(message.clone());
                }
            }
        }

        let comment = state
            .block_mut(id)?
            .comment_mut(comment_id)
            .ok_or_else(|| SessionError::UnknownComment(comment_id.to_string()))?;
        match outcome {
            Ok(text) => comment.succeed(text),
            Err(message) => comment.fail(message),
        }
        result
    }

    /// Rewrite a section so it addresses a finished review comment.
    ///
    /// On success the section is `Completed`; the comment is left as is.
    pub async fn apply_review(&self, id: u32, comment_id: &str) -> Result<String, SessionError> {
        let (brief, outline, block, writer, feedback, epoch) = {
            let mut state = self.lock();
            let block = state.block(id)?.clone();
            let comment = block
                .comment(comment_id)
                .ok_or_else(|| SessionError::UnknownComment(comment_id.to_string()))?;
            if comment.status != CommentStatus::Success {
                return Err(SessionError::CommentNotReady(comment_id.to_string()));
            }
            let feedback = comment.text.clone();
            let writer = state.agent_for(&block, AgentRole::ContentWriter)?;
            let epoch = Self::begin_generation(&mut state, id)?;
            (state.brief.clone(), state.blocks.clone(), block, writer, feedback, epoch)
        };

        let result = self
            .ctx
            .agent(writer)
            .rewrite(&brief, &outline, &block, &block.content, &feedback)
            .await;

        let mut state = self.lock();
        let Some(status) = state.current_status(id, epoch) else {
            tracing::debug!("Section {} was replaced while it was being rewritten", id);
            return Err(SessionError::UnknownBlock(id));
        };
        status.is_loading = false;
        match result {
            Ok(content) => {
                status.review_status = ReviewStatus::Completed;
                state.block_mut(id)?.content = content.clone();
                Ok(content)
            }
            Err(e) => {
                tracing::warn!("Rewrite of section {} failed: {}", id, e);
                status.review_status = ReviewStatus::Error;
                status.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn to_markdown(&self) -> String {
        let state = self.lock();
        document::to_markdown(state.title.as_deref(), &state.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::Tone;
    use crate::config::Settings;
    use crate::providers::ProviderSettings;
    use crate::store::{ConfigStore, MemoryStore};
    use mockito::{Matcher, Server, ServerGuard};
    use std::io::Write;
    use std::time::Duration;

    fn context() -> Arc<AppContext> {
        Arc::new(AppContext::with_store(Settings::default(), Arc::new(MemoryStore::new())).unwrap())
    }

    fn session_in(ctx: &Arc<AppContext>) -> EditingSession {
        EditingSession::new(ctx.clone(), DocumentBrief::new("post", "Tea", "drinkers"))
    }

    fn session() -> EditingSession {
        session_in(&context())
    }

    fn connect(ctx: &AppContext, server: &ServerGuard) {
        ctx.registry()
            .get_provider("openai")
            .unwrap()
            .configure(
                ProviderSettings::new()
                    .with("apiKey", "test-api-key")
                    .with("model", "gpt-4o")
                    .with("baseUrl", server.url()),
            )
            .unwrap();
    }

    fn completion(content: &str) -> String {
        serde_json::json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })
            .to_string()
    }

    async fn answer(server: &mut ServerGuard, content: &str) -> mockito::Mock {
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(completion(content))
            .create_async()
            .await
    }

    #[test]
    fn test_add_remove_preserves_order() {
        let session = session();
        let a = session.add_block("A", "first");
        let b = session.add_block("B", "second");
        let c = session.add_block("C", "third");
        assert_eq!((a, b, c), (1, 2, 3));

        session.remove_block(b).unwrap();
        let titles: Vec<_> = session.blocks().into_iter().map(|b| b.title).collect();
        assert_eq!(titles, vec!["A", "C"]);
        assert_eq!(session.add_block("D", "fourth"), 4);
        assert!(matches!(session.remove_block(b), Err(SessionError::UnknownBlock(2))));
    }

    #[tokio::test]
    async fn test_review_failure_is_recorded_not_left_loading() {
        let session = session();
        let id = session.add_block("Intro", "Start here");

        let err = session.request_review(id, None).await.unwrap_err();
        assert!(matches!(err, SessionError::Agent(ref e) if e.is_configuration()));

        let status = session.status(id);
        assert_eq!(status.review_status, ReviewStatus::Error);
        assert!(status.error.is_some());
        assert!(status.is_initial_review);

        let block = session.block(id).unwrap();
        assert_eq!(block.comments.len(), 1);
        assert_eq!(block.comments[0].status, CommentStatus::Error);
    }

    #[tokio::test]
    async fn test_second_review_while_reviewing_is_rejected() {
        let session = session();
        let id = session.add_block("Intro", "Start here");
        session.lock().status_mut(id).unwrap().review_status = ReviewStatus::Reviewing;

        assert!(matches!(
            session.request_review(id, None).await,
            Err(SessionError::ReviewInProgress(_))
        ));
    }

    #[tokio::test]
    async fn test_generation_failure_clears_loading() {
        let session = session();
        let id = session.add_block("Intro", "Start here");
        assert!(session.generate_content(id).await.is_err());
        let status = session.status(id);
        assert!(!status.is_loading);
        assert!(status.error.is_some());
    }

    #[tokio::test]
    async fn test_missing_reviewer_is_reported() {
        let session = session();
        session.set_default_agents(None, None);
        let id = session.add_block("Intro", "Start here");
        assert!(matches!(
            session.request_review(id, None).await,
            Err(SessionError::NoAgent(AgentRole::ContentReviewer))
        ));
        // Nothing changed on the block
        assert_eq!(session.status(id).review_status, ReviewStatus::Pending);
    }

    #[test]
    fn test_save_and_restore_settles_in_flight_state() {
        let store: Arc<dyn ConfigStore> = Arc::new(MemoryStore::new());
        let ctx = Arc::new(AppContext::with_store(Settings::default(), store).unwrap());

        let session = EditingSession::new(ctx.clone(), DocumentBrief::new("post", "Tea", "drinkers"));
        session.set_title("All about tea");
        let id = session.add_block("Intro", "Start here");
        {
            let mut state = session.lock();
            state.status_mut(id).unwrap().review_status = ReviewStatus::Reviewing;
            state.block_mut(id).unwrap().comments.push(Comment::pending("Reviewer"));
        }
        session.save().unwrap();

        let restored = EditingSession::restore(ctx).unwrap().unwrap();
        assert_eq!(restored.status(id).review_status, ReviewStatus::Error);
        assert_eq!(
            restored.block(id).unwrap().comments[0].status,
            CommentStatus::Error
        );
        assert!(restored.to_markdown().starts_with("# All about tea"));
    }

    #[test]
    fn test_restore_without_saved_session() {
        let ctx = AppContext::with_store(Settings::default(), Arc::new(MemoryStore::new())).unwrap();
        assert!(EditingSession::restore(Arc::new(ctx)).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_errored_comment_cannot_drive_a_rewrite() {
        let ctx = context();
        let session = session_in(&ctx);
        let id = session.add_block("Intro", "Start here");
        session.update_block(id, |b| b.content = "Tea is old.".into()).unwrap();
        assert!(session.request_review(id, None).await.is_err());
        let comment_id = session.block(id).unwrap().comments[0].id.clone();

        let mut server = Server::new_async().await;
        let mock = server.mock("POST", Matcher::Any).expect(0).create_async().await;
        connect(&ctx, &server);

        assert!(matches!(
            session.apply_review(id, &comment_id).await,
            Err(SessionError::CommentNotReady(c)) if c == comment_id
        ));
        mock.assert_async().await;

        let status = session.status(id);
        assert_eq!(status.review_status, ReviewStatus::Error);
        assert!(!status.is_loading);
        assert_eq!(session.block(id).unwrap().content, "Tea is old.");
    }

    #[tokio::test]
    async fn test_loading_comment_cannot_drive_a_rewrite() {
        let session = session();
        let id = session.add_block("Intro", "Start here");
        session
            .update_block(id, |b| b.comments.push(Comment::pending("Reviewer")))
            .unwrap();
        let comment_id = session.block(id).unwrap().comments[0].id.clone();

        assert!(matches!(
            session.apply_review(id, &comment_id).await,
            Err(SessionError::CommentNotReady(_))
        ));
        assert!(!session.status(id).is_loading);
    }

    #[tokio::test]
    async fn test_retry_overwrites_the_same_comment() {
        let ctx = context();
        let session = session_in(&ctx);
        let id = session.add_block("Intro", "Start here");

        // error -> loading -> success
        assert!(session.request_review(id, None).await.is_err());
        let comment_id = session.block(id).unwrap().comments[0].id.clone();

        let mut server = Server::new_async().await;
        let first = answer(&mut server, "- Tighten the opening").await;
        connect(&ctx, &server);

        session.retry_review(id, &comment_id, None).await.unwrap();
        let block = session.block(id).unwrap();
        assert_eq!(block.comments.len(), 1);
        assert_eq!(block.comments[0].id, comment_id);
        assert_eq!(block.comments[0].status, CommentStatus::Success);
        assert_eq!(block.comments[0].text, "- Tighten the opening");
        let status = session.status(id);
        assert_eq!(status.review_status, ReviewStatus::Completed);
        assert!(!status.is_initial_review);
        assert!(status.error.is_none());

        // success -> loading -> success, the old text is gone
        first.remove_async().await;
        answer(&mut server, "- Add a closing line").await;
        session.retry_review(id, &comment_id, None).await.unwrap();
        let block = session.block(id).unwrap();
        assert_eq!(block.comments.len(), 1);
        assert_eq!(block.comments[0].text, "- Add a closing line");
    }

    #[tokio::test]
    async fn test_retry_of_loading_comment_is_busy() {
        let session = session();
        let id = session.add_block("Intro", "Start here");
        session
            .update_block(id, |b| b.comments.push(Comment::pending("Reviewer")))
            .unwrap();
        let comment_id = session.block(id).unwrap().comments[0].id.clone();

        assert!(matches!(
            session.retry_review(id, &comment_id, None).await,
            Err(SessionError::CommentBusy(c)) if c == comment_id
        ));
        // The block was never marked under review
        assert_eq!(session.status(id).review_status, ReviewStatus::Pending);
        assert!(matches!(
            session.retry_review(id, "nope", None).await,
            Err(SessionError::UnknownComment(_))
        ));
    }

    #[test]
    fn test_assigned_agents_are_snapshots() {
        let ctx = context();
        let session = session_in(&ctx);
        let id = session.add_block("Intro", "Start here");
        let writer = ctx.agents().first_with_role(AgentRole::ContentWriter).unwrap();
        let reviewer = ctx.agents().first_with_role(AgentRole::ContentReviewer).unwrap();
        assert_ne!(writer.tone, Tone::Humorous);

        session
            .assign_agents(id, Some(writer.clone()), Some(reviewer.clone()))
            .unwrap();
        ctx.agents().update(&writer.id, |a| a.tone = Tone::Humorous).unwrap();
        ctx.agents().delete(&reviewer.id).unwrap();

        let block = session.block(id).unwrap();
        assert_eq!(block.writer, Some(writer));
        assert_eq!(block.reviewer, Some(reviewer));

        // Passing None leaves an assignment in place
        session.assign_agents(id, None, None).unwrap();
        assert!(session.block(id).unwrap().writer.is_some());
    }

    #[tokio::test]
    async fn test_late_review_does_not_touch_a_replacement_block() {
        let ctx = context();
        let session = session_in(&ctx);
        let id = session.add_block("Old", "Going away");

        let mut server = Server::new_async().await;
        let body = completion("- Late feedback");
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_chunked_body(move |w| {
                std::thread::sleep(Duration::from_millis(300));
                w.write_all(body.as_bytes())
            })
            .create_async()
            .await;
        connect(&ctx, &server);

        let (review, replacement) = tokio::join!(session.request_review(id, None), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.remove_block(id).unwrap();
            session.add_block("Brand new", "Never reviewed")
        });

        assert_eq!(replacement, id);
        assert!(matches!(review, Err(SessionError::UnknownBlock(b)) if b == id));
        let status = session.status(replacement);
        assert_eq!(status.review_status, ReviewStatus::Pending);
        assert!(status.is_initial_review);
        assert!(session.block(replacement).unwrap().comments.is_empty());
    }

    #[tokio::test]
    async fn test_late_content_does_not_touch_a_removed_block() {
        let ctx = context();
        let session = session_in(&ctx);
        let id = session.add_block("Old", "Going away");

        let mut server = Server::new_async().await;
        let body = completion("Late prose");
        server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_chunked_body(move |w| {
                std::thread::sleep(Duration::from_millis(300));
                w.write_all(body.as_bytes())
            })
            .create_async()
            .await;
        connect(&ctx, &server);

        let (written, _) = tokio::join!(session.generate_content(id), async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            session.remove_block(id).unwrap();
        });

        assert!(matches!(written, Err(SessionError::UnknownBlock(_))));
        assert!(session.blocks().is_empty());
        assert!(session.snapshot().status.is_empty());
    }
}
