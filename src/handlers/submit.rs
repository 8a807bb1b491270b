//! Submit handler: validates the case, calls the webhook and reports the outcome.

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::TryRecvError;

use rca_console::{
    submit::SubmitError, CaseForm, Notifier, Rendition, ResultEvent, SubmitMethod, Submitter,
};

use super::{emit_document, report::explain, Console};
use crate::cli::SubmitArgs;

pub struct SubmitHandler;

impl SubmitHandler {
    pub async fn run(console: &Console, args: &SubmitArgs, piped_description: Option<String>) -> Result<()> {
        let mut form = if args.example {
            CaseForm::example()
        } else {
            CaseForm {
                duration_minutes: args.duration.clone(),
                reduction_percent: args.reduction.clone(),
                estimated_cost: args.cost.clone(),
                hourly_revenue: args.revenue.clone(),
                equipment_tag: args.tag.clone(),
                asset_number: args.asset.clone(),
                ..CaseForm::default()
            }
        };
        if let Some(desc) = args.description.clone().or(piped_description) {
            form.description = desc;
        }

        let settings = console.settings();
        let url = match &args.url {
            Some(url) => {
                if settings.load().auto_save {
                    settings.save_webhook_url(url)?;
                }
                url.clone()
            }
            None => settings.webhook_url(),
        };
        let method = if args.form { SubmitMethod::Form } else { SubmitMethod::Fetch };
        let prompts = console.prompts().load();

        let notifier = Notifier::default();
        let mut events = notifier.subscribe();
        let submitter = Submitter::from_config(&console.cfg, console.store.clone(), notifier)?;

        console.notice.info("Generating analysis, please wait...");
        let result = match submitter.submit(method, &url, &form, &prompts).await {
            Ok(result) => result,
            Err(err @ (SubmitError::MissingUrl | SubmitError::InvalidUrl(_) | SubmitError::MissingDescription)) => {
                bail!("{}", err)
            }
            Err(err) => return Err(err).context("submission failed"),
        };

        loop {
            match events.try_recv() {
                Ok(ResultEvent::Completed { success: true, status }) => {
                    console.notice.success(&format!("Analysis complete (status {})", status))
                }
                Ok(ResultEvent::Completed { success: false, status }) => {
                    console.notice.failure(&format!("Analysis failed (status {})", status))
                }
                Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        if method == SubmitMethod::Form {
            console.notice.info("Sent via the alternative method; the outcome is not visible here. Check the destination for the report.");
            return Ok(());
        }

        let renderer = console.renderer();
        match renderer.render(&result) {
            Rendition::Document(doc) => match &args.out {
                Some(path) => {
                    emit_document(&renderer, &doc, args.raw, Some(path))?;
                    console.notice.info(&format!("Report written to {}", path.display()));
                }
                None => console.notice.info("Run `rca report` to view the report."),
            },
            Rendition::NoContent(reason) => console.notice.failure(&explain(reason)),
        }
        Ok(())
    }
}
