//! Report handler: renders the cached result, optionally following updates.

use anyhow::{bail, Result};
use tracing::debug;

use rca_console::{
    notify::Refresh, NoContentReason, Notifier, ReportView, Rendition, ResultEvent, ResultPoller, StorageWatcher,
};

use super::{emit_document, Console};
use crate::cli::ReportArgs;

pub struct ReportHandler;

impl ReportHandler {
    pub async fn run(console: &Console, args: &ReportArgs) -> Result<()> {
        let cache = console.cache();

        if args.clear {
            cache.clear()?;
            console.notice.info("Cached result cleared");
            return Ok(());
        }

        if args.json {
            let Some(result) = cache.read() else {
                bail!("{}", explain(NoContentReason::Missing));
            };
            println!("{}", serde_json::to_string_pretty(&result.data)?);
            return Ok(());
        }

        let renderer = console.renderer();
        if !args.watch {
            return match renderer.render_cached(cache.read().as_ref()) {
                Rendition::Document(doc) => emit_document(&renderer, &doc, args.raw, args.out.as_deref()),
                Rendition::NoContent(reason) => bail!("{}", explain(reason)),
            };
        }

        let notifier = Notifier::default();
        let events = notifier.subscribe();
        let mut view = ReportView::new(cache.clone(), renderer.clone());
        if let Refresh::Changed(Rendition::Document(doc)) = view.refresh() {
            emit_document(&renderer, &doc, args.raw, args.out.as_deref())?;
        }

        let watcher = StorageWatcher::new(cache.clone(), console.cfg.poll_interval()).spawn(notifier.clone());
        if view.current().is_none() {
            ResultPoller::new(cache, console.cfg.poll_interval(), console.cfg.poll_window()).spawn(notifier.clone());
        }
        console.notice.info("Following report updates (Ctrl-C to stop)...");

        let notice = &console.notice;
        let follow = view.follow(events, |event, rendition, _| {
            debug!(?event, "report changed");
            if let ResultEvent::StorageChanged { key } = event {
                notice.info(&format!("Result updated ({})", key));
            }
            match rendition {
                Rendition::Document(doc) => {
                    if let Err(err) = emit_document(&renderer, doc, args.raw, args.out.as_deref()) {
                        notice.failure(&err.to_string());
                    }
                }
                Rendition::NoContent(reason) => notice.failure(&explain(*reason)),
            }
        });

        tokio::select! {
            _ = follow => {}
            _ = tokio::signal::ctrl_c() => {}
        }
        watcher.abort();
        Ok(())
    }
}

pub fn explain(reason: NoContentReason) -> String {
    match reason {
        NoContentReason::Missing => "No analysis result stored yet; run `rca submit` first.".to_string(),
        NoContentReason::CallFailed { status: 0 } => {
            "The last call never reached the webhook (network error); no report available.".to_string()
        }
        NoContentReason::CallFailed { status } => {
            format!("The webhook answered with status {}; no report available.", status)
        }
        NoContentReason::NoHtml => {
            "The call succeeded but returned no HTML report; use `rca report --json` to inspect the data.".to_string()
        }
    }
}
