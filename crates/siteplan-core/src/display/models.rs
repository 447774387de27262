//! Display implementations for domain models.
//!
//! All output is markdown, rendered by the CLI's terminal renderer.

use std::fmt;

use super::datetime::{LocalDate, LocalDateTime};
use crate::models::{
    ActionPlan, Analysis, AnalysisSummary, Finding, Priority, Severity, Task, TaskStatus, Verdict,
    VerdictOutcome,
};

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        })
    }
}

impl fmt::Display for VerdictOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VerdictOutcome::Resolved => "Resolved",
            VerdictOutcome::StillOpen => "Still open",
            VerdictOutcome::Inconclusive => "Inconclusive",
        })
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "- **{}** ({}, {})",
            self.title, self.category, self.severity
        )?;
        if !self.detail.is_empty() {
            write!(f, ": {}", self.detail)?;
        }
        writeln!(f)
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.url)?;
        writeln!(f)?;

        writeln!(f, "- ID: {}", self.id)?;
        if let Some(owner) = &self.owner {
            writeln!(f, "- Owner: {owner}")?;
        }
        writeln!(f, "- Score: {}/100", self.report.overall_score)?;
        if let Some(title) = &self.snapshot.title {
            writeln!(f, "- Page title: {title}")?;
        }
        writeln!(f, "- Analyzed: {}", LocalDateTime(&self.analyzed_at))?;
        writeln!(f, "- Updated: {}", LocalDateTime(&self.updated_at))?;

        if let Some(summary) = &self.report.summary {
            writeln!(f)?;
            writeln!(f, "{summary}")?;
        }

        if !self.report.category_scores.is_empty() {
            writeln!(f, "\n## Scores")?;
            writeln!(f)?;
            for (category, score) in &self.report.category_scores {
                writeln!(f, "- {category}: {score}")?;
            }
        }

        if !self.report.findings.is_empty() {
            writeln!(f, "\n## Findings")?;
            writeln!(f)?;
            for finding in &self.report.findings {
                write!(f, "{finding}")?;
            }
        }

        match &self.plan {
            Some(plan) => write!(f, "\n{plan}"),
            None => writeln!(f, "\nNo plan generated yet."),
        }
    }
}

impl fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## Action Plan")?;
        writeln!(f)?;
        writeln!(f, "{}", self.summary)?;
        writeln!(f)?;

        if let Some(timeline) = &self.timeline {
            writeln!(f, "- Timeline: {timeline}")?;
        }
        writeln!(f, "- Generated: {}", LocalDateTime(&self.generated_at))?;

        if !self.quick_wins.is_empty() {
            writeln!(f, "\n### Quick Wins")?;
            writeln!(f)?;
            for win in &self.quick_wins {
                writeln!(f, "- {win}")?;
            }
        }

        Ok(())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "### {}. {} ({})",
            self.sequence + 1,
            self.title,
            self.status.with_icon()
        )?;
        writeln!(f)?;

        writeln!(f, "- ID: {}", self.id)?;
        writeln!(
            f,
            "- Priority: {} | Effort: {} | Impact: {}",
            self.priority, self.effort, self.impact
        )?;
        writeln!(f, "- Category: {}", self.category)?;
        if let Some(estimate) = &self.estimated_time {
            writeln!(f, "- Estimated time: {estimate}")?;
        }
        if let Some(started) = &self.started_at {
            writeln!(f, "- Started: {}", LocalDateTime(started))?;
        }
        if self.status == TaskStatus::Completed {
            if let Some(completed) = &self.completed_at {
                writeln!(f, "- Completed: {}", LocalDateTime(completed))?;
            }
        }
        writeln!(f)?;

        if !self.description.is_empty() {
            writeln!(f, "{}", self.description)?;
            writeln!(f)?;
        }

        if let Some(notes) = &self.notes {
            writeln!(f, "#### Notes")?;
            writeln!(f)?;
            writeln!(f, "{notes}")?;
            writeln!(f)?;
        }

        if let (Some(verdict), Some(at)) = (&self.last_reanalysis, &self.last_reanalyzed_at) {
            writeln!(f, "#### Last Check ({})", LocalDateTime(at))?;
            writeln!(f)?;
            write!(f, "{verdict}")?;
            writeln!(f)?;
        }

        Ok(())
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "**{}**", self.outcome)?;
        if !self.detail.is_empty() {
            writeln!(f)?;
            writeln!(f, "{}", self.detail)?;
        }
        if !self.evidence.is_empty() {
            writeln!(f)?;
            for item in &self.evidence {
                writeln!(f, "- {item}")?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for AnalysisSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let progress = if self.total_tasks > 0 {
            format!(" ({}/{})", self.completed_tasks, self.total_tasks)
        } else {
            String::new()
        };

        writeln!(f, "## {}{progress}", self.url)?;
        writeln!(f)?;
        writeln!(f, "- **ID**: {}", self.id)?;
        writeln!(f, "- **Score**: {}/100", self.overall_score)?;
        if let Some(summary) = &self.plan_summary {
            writeln!(f, "- **Plan**: {summary}")?;
        }
        writeln!(f, "- **Analyzed**: {}", LocalDate(&self.analyzed_at))?;
        writeln!(f)
    }
}
