//! Termination - deciding when the architecture document is done

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::SquadError;
use crate::transcript::{AgentId, Transcript, Turn};

/// Outcome of a termination check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Keep going - select the next speaker
    Continue,
    /// The document is complete; the session finished successfully
    Complete,
    /// The iteration ceiling was hit before completion
    Aborted,
}

/// Judgment over the latest turn: does it close out the document?
#[async_trait]
pub trait CompletionJudge: Send + Sync {
    async fn is_complete(&self, latest: &Turn) -> anyhow::Result<bool>;
}

/// Per-turn termination decision.
///
/// The iteration ceiling is a convergence failsafe: the judge is not
/// guaranteed to ever signal completion, so the ceiling takes precedence
/// over whatever the judge would say.
pub struct TerminationPolicy {
    max_iterations: usize,
    judge: Arc<dyn CompletionJudge>,
    scope: Option<HashSet<AgentId>>,
}

impl TerminationPolicy {
    pub fn new(max_iterations: usize, judge: Arc<dyn CompletionJudge>) -> Self {
        Self {
            max_iterations,
            judge,
            scope: None,
        }
    }

    /// Only consult the judge when one of `agents` produced the latest
    /// turn; turns by anyone else always continue. Typically scoped to the
    /// documentation specialist, who is the only agent producing full
    /// documents.
    pub fn scoped_to(mut self, agents: impl IntoIterator<Item = AgentId>) -> Self {
        self.scope = Some(agents.into_iter().collect());
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Decide whether the session stops here.
    ///
    /// `iterations` counts completed turns; once it reaches the ceiling the
    /// verdict is `Aborted` without consulting the judge.
    pub async fn should_stop(
        &self,
        transcript: &Transcript,
        iterations: usize,
    ) -> Result<Verdict, SquadError> {
        if iterations >= self.max_iterations {
            return Ok(Verdict::Aborted);
        }

        let Some(latest) = transcript.last() else {
            return Ok(Verdict::Continue);
        };

        if let Some(scope) = &self.scope {
            if !scope.contains(&latest.speaker) {
                return Ok(Verdict::Continue);
            }
        }

        let complete = self
            .judge
            .is_complete(latest)
            .await
            .map_err(SquadError::Judgment)?;

        debug!(speaker = %latest.speaker, complete, "Completion judgment");
        Ok(if complete {
            Verdict::Complete
        } else {
            Verdict::Continue
        })
    }
}

/// Structural completion check: the latest contribution must contain every
/// required section heading.
///
/// Stricter than matching a completion keyword in model output, which can
/// fire on an agent merely talking about being done. Matching is
/// case-insensitive.
pub struct SectionChecklist {
    sections: Vec<String>,
}

impl SectionChecklist {
    pub fn new<I, S>(sections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            sections: sections.into_iter().map(Into::into).collect(),
        }
    }

    /// The section set of a full architecture document
    pub fn architecture_document() -> Self {
        Self::new([
            "Executive Summary",
            "System Overview and Objectives",
            "Architecture Overview",
            "Component Architecture",
            "Security Design",
            "Data Architecture",
            "Technology Stack",
            "Deployment Guide",
            "Operational Considerations",
        ])
    }

    pub fn sections(&self) -> &[String] {
        &self.sections
    }
}

#[async_trait]
impl CompletionJudge for SectionChecklist {
    async fn is_complete(&self, latest: &Turn) -> anyhow::Result<bool> {
        let haystack = latest.content.to_lowercase();
        Ok(self
            .sections
            .iter()
            .all(|section| haystack.contains(&section.to_lowercase())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Always(bool);

    #[async_trait]
    impl CompletionJudge for Always {
        async fn is_complete(&self, _latest: &Turn) -> anyhow::Result<bool> {
            Ok(self.0)
        }
    }

    fn transcript_with(speaker: &str, content: &str) -> Transcript {
        let mut t = Transcript::new();
        t.push(Turn::new(speaker, content));
        t
    }

    #[tokio::test]
    async fn test_ceiling_takes_precedence_over_judge() {
        // Even a judge that would signal completion loses to the ceiling.
        let policy = TerminationPolicy::new(3, Arc::new(Always(true)));
        let transcript = transcript_with("Documentation_Specialist", "full document");

        let verdict = policy.should_stop(&transcript, 3).await.unwrap();
        assert_eq!(verdict, Verdict::Aborted);
    }

    #[tokio::test]
    async fn test_judge_decides_below_ceiling() {
        let transcript = transcript_with("Documentation_Specialist", "draft");

        let done = TerminationPolicy::new(10, Arc::new(Always(true)));
        assert_eq!(
            done.should_stop(&transcript, 4).await.unwrap(),
            Verdict::Complete
        );

        let not_done = TerminationPolicy::new(10, Arc::new(Always(false)));
        assert_eq!(
            not_done.should_stop(&transcript, 4).await.unwrap(),
            Verdict::Continue
        );
    }

    #[tokio::test]
    async fn test_empty_transcript_continues() {
        let policy = TerminationPolicy::new(10, Arc::new(Always(true)));
        let verdict = policy.should_stop(&Transcript::new(), 0).await.unwrap();
        assert_eq!(verdict, Verdict::Continue);
    }

    #[tokio::test]
    async fn test_scope_skips_judge_for_other_speakers() {
        let policy = TerminationPolicy::new(10, Arc::new(Always(true)))
            .scoped_to([AgentId::from("Documentation_Specialist")]);

        let out_of_scope = transcript_with("Security_Architect", "complete document");
        assert_eq!(
            policy.should_stop(&out_of_scope, 2).await.unwrap(),
            Verdict::Continue
        );

        let in_scope = transcript_with("Documentation_Specialist", "complete document");
        assert_eq!(
            policy.should_stop(&in_scope, 2).await.unwrap(),
            Verdict::Complete
        );
    }

    #[tokio::test]
    async fn test_section_checklist() {
        let checklist = SectionChecklist::new(["Executive Summary", "Security Design"]);

        let partial = Turn::new("Documentation_Specialist", "## Executive Summary\n...");
        assert!(!checklist.is_complete(&partial).await.unwrap());

        let full = Turn::new(
            "Documentation_Specialist",
            "## Executive summary\n...\n## SECURITY DESIGN\n...",
        );
        assert!(checklist.is_complete(&full).await.unwrap());
    }
}
