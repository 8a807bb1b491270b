use std::fmt::Write as _;

use anyhow::Result;

use rca_console::stats::AnalysisHistory;

use super::Console;
use crate::printer::MarkdownPrinter;

pub struct StatsHandler;

impl StatsHandler {
    pub fn run(console: &Console) -> Result<()> {
        let history = AnalysisHistory::new(console.store.clone(), console.cfg.history_length());
        let stats = history.stats(console.cache().read().as_ref());

        let mut md = String::new();
        writeln!(md, "## Dashboard\n")?;
        writeln!(md, "|:-|-:|")?;
        writeln!(md, "| Analyses | {} |", stats.total)?;
        writeln!(md, "| Successful | {} |", stats.successful)?;
        writeln!(md, "| Failed | {} |", stats.failed)?;
        writeln!(md, "| Success rate | {:.1}% |", stats.success_rate())?;
        writeln!(md, "| Avg. processing | {:.0} ms |", stats.avg_processing_ms)?;
        writeln!(md, "| Last analysis | {} |", stats.last_analysis.as_deref().unwrap_or("-"))?;
        writeln!(md, "|-\n")?;

        writeln!(md, "## Recent days\n")?;
        writeln!(md, "|:-|-:|-:|-:|")?;
        writeln!(md, "|**Day**|**Analyses**|**Success**|**Failed**|")?;
        writeln!(md, "|-")?;
        for day in &stats.recent_days {
            writeln!(md, "| {} | {} | {} | {} |", day.day, day.analyses, day.success, day.failed)?;
        }
        writeln!(md, "|-")?;

        MarkdownPrinter::default().print(&md);
        Ok(())
    }
}
