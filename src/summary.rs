//! Summary generation with template fallback

use crate::{
    commit::CommitDescriptor, endpoint::Endpoint, selector::SelectionOutcome, template, Error,
    Result,
};
use async_trait::async_trait;
use log::{info, warn};

const SYSTEM_PROMPT: &str = "You are a technical writer. Your task is to create a detailed, \
informative article based on Git commit information. The article should be professional \
yet accessible, explaining the changes and their significance in a clear, concise manner. \
Use proper HTML formatting with appropriate headings, paragraphs, and lists.";

/// A single non-streaming completion request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub system: Option<String>,
}

impl GenerationRequest {
    pub fn for_commit(commit: &CommitDescriptor) -> Self {
        let mut prompt = String::from(
            "Please analyze the following Git commit and generate a detailed article:\n\n",
        );
        prompt.push_str(&format!(
            "Repository: {}\nCommit: {}\nAuthor: {}\nDate: {}\nMessage: {}\n",
            commit.repository_name, commit.short_id, commit.author, commit.date, commit.message
        ));
        prompt.push_str("\nChanged files:\n");
        for file in &commit.changed_files {
            prompt.push_str(&format!("- {} {}\n", file.status, file.path));
        }
        prompt.push_str(
            "\nPlease provide a detailed analysis of these changes, including:\n\
             1. What was changed and why it's important\n\
             2. Any potential impact on the project\n\
             3. Technical details that would be relevant to developers\n\n\
             Format your response in HTML with appropriate headings, paragraphs, and lists.\n",
        );

        Self {
            prompt,
            system: Some(SYSTEM_PROMPT.to_string()),
        }
    }
}

/// Something that can turn a prompt into text on a given endpoint
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    async fn generate(&self, endpoint: &Endpoint, request: &GenerationRequest) -> Result<String>;
}

/// Where a summary body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummarySource {
    Template,
    Generated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedSummary {
    pub title: String,
    pub html_body: String,
    pub source: SummarySource,
}

impl GeneratedSummary {
    /// Template summary; the same commit always gives the same body
    pub fn from_template(commit: &CommitDescriptor) -> Self {
        Self {
            title: template::title(&commit.repository_name, &commit.message),
            html_body: template::render(commit),
            source: SummarySource::Template,
        }
    }

    fn from_generated(commit: &CommitDescriptor, text: &str) -> Self {
        let mut html_body = text.to_string();
        html_body.push_str(&template::commit_details_footer(commit));

        Self {
            title: template::title(&commit.repository_name, text),
            html_body,
            source: SummarySource::Generated,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == SummarySource::Template
    }
}

/// Writes the post body for a commit
///
/// `generate` always produces a summary: a missing backend or any failure on
/// the selected one ends in the template.
pub struct SummaryGenerator<B> {
    backend: B,
}

impl<B: GenerationBackend> SummaryGenerator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn generate(
        &self,
        selection: &SelectionOutcome,
        commit: &CommitDescriptor,
    ) -> GeneratedSummary {
        let endpoint = match selection {
            SelectionOutcome::Selected(endpoint) => endpoint,
            SelectionOutcome::NoneAvailable => {
                info!("No generation backend available, using template summary");
                return GeneratedSummary::from_template(commit);
            }
        };

        match self.attempt(endpoint, commit).await {
            Ok(text) => GeneratedSummary::from_generated(commit, &text),
            Err(e) => {
                warn!("{}; falling back to template summary", e);
                GeneratedSummary::from_template(commit)
            }
        }
    }

    async fn attempt(&self, endpoint: &Endpoint, commit: &CommitDescriptor) -> Result<String> {
        let request = GenerationRequest::for_commit(commit);

        let text = tokio::time::timeout(endpoint.timeout, self.backend.generate(endpoint, &request))
            .await
            .map_err(|_| Error::GenerationFailed {
                endpoint: endpoint.name.clone(),
                reason: format!("timed out after {:?}", endpoint.timeout),
            })??;

        if text.trim().is_empty() {
            return Err(Error::GenerationFailed {
                endpoint: endpoint.name.clone(),
                reason: "empty response".to_string(),
            });
        }

        Ok(text)
    }
}
