//! Wizard flow for the create command.
//!
//! Walks the five wizard steps in the terminal. Values passed on the command
//! line are applied up front; in interactive mode the remaining fields are
//! prompted with dialoguer, otherwise a validation failure ends the flow.

use std::collections::BTreeSet;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Result, bail};
use console::style;
use dialoguer::{Confirm, Input, Password, Select, theme::ColorfulTheme};
use tokio::runtime::Runtime;

use rollout_core::source::DataSource;
use rollout_core::wizard::validation;
use rollout_core::wizard::{
    Field, ScheduleMode, SubmitResult, ValidationErrors, WizardController, WizardStep,
};

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct PrefilledOptions {
    /// Field values applied before the first step
    pub fields: Vec<(Field, String)>,
    /// Installer file to upload on the installer step
    pub installer_path: Option<PathBuf>,
    /// Run an assessment scan after the targets step
    pub scan: bool,
    /// Skip the final confirmation
    pub yes: bool,
}

impl PrefilledOptions {
    fn has(&self, field: Field) -> bool {
        self.fields.iter().any(|(f, _)| *f == field)
    }
}

/// Terminal driver for a [`WizardController`].
pub struct WizardFlow<'rt, W: Write = io::Stdout> {
    runtime: &'rt Runtime,
    wizard: WizardController,
    prefilled: PrefilledOptions,
    interactive: bool,
    writer: W,
    theme: ColorfulTheme,
}

impl<'rt> WizardFlow<'rt, io::Stdout> {
    pub fn new(
        runtime: &'rt Runtime,
        source: DataSource,
        prefilled: PrefilledOptions,
        interactive: bool,
    ) -> Self {
        Self::with_writer(runtime, source, prefilled, interactive, io::stdout())
    }
}

impl<'rt, W: Write> WizardFlow<'rt, W> {
    pub fn with_writer(
        runtime: &'rt Runtime,
        source: DataSource,
        prefilled: PrefilledOptions,
        interactive: bool,
        writer: W,
    ) -> Self {
        Self {
            runtime,
            wizard: WizardController::new(source),
            prefilled,
            interactive,
            writer,
            theme: ColorfulTheme::default(),
        }
    }

    /// Run every step and submit.
    ///
    /// Returns `None` when the operator declined the final confirmation.
    pub fn run(&mut self) -> Result<Option<SubmitResult>> {
        self.print_header()?;

        for (field, value) in self.prefilled.fields.clone() {
            self.wizard.set_field(field, &value).map_err(anyhow::Error::msg)?;
        }

        let mut reprompt = BTreeSet::new();
        while self.wizard.step() != WizardStep::LAST {
            let step = self.wizard.step();
            writeln!(
                self.writer,
                "{}",
                style(format!(
                    "  Step {}/{}: {}",
                    step.index() + 1,
                    WizardStep::ALL.len(),
                    step.label()
                ))
                .bold()
            )?;

            if step == WizardStep::Installer {
                self.installer_step()?;
            }
            if self.interactive {
                self.prompt_step(step, &reprompt)?;
            }
            if step == WizardStep::Targets {
                self.scan_step()?;
            }

            match self.wizard.advance() {
                Ok(_) => reprompt.clear(),
                Err(errors) => {
                    self.print_errors(&errors)?;
                    if !self.interactive {
                        bail!("{} field(s) failed validation", errors.len());
                    }
                    reprompt = errors.iter().map(|(field, _)| field).collect();
                }
            }
        }

        self.print_summary()?;

        if self.interactive && !self.prefilled.yes {
            let confirmed = Confirm::with_theme(&self.theme)
                .with_prompt("Create this deployment task?")
                .default(true)
                .interact()?;
            if !confirmed {
                return Ok(None);
            }
        }

        let result = self.runtime.block_on(self.wizard.submit());
        if let Some(message) = self.wizard.status_message() {
            let line = if result.is_created() {
                style(message).green()
            } else {
                style(message).red()
            };
            writeln!(self.writer, "  {}", line)?;
        }
        Ok(Some(result))
    }

    pub fn wizard(&self) -> &WizardController {
        &self.wizard
    }

    fn print_header(&mut self) -> Result<()> {
        writeln!(self.writer)?;
        write!(
            self.writer,
            "{}",
            style("  Create Deployment Task").bold().cyan()
        )?;
        if self.wizard.source().is_demo() {
            write!(self.writer, " {}", style("(demo mode)").yellow())?;
        }
        writeln!(self.writer)?;
        writeln!(self.writer)?;
        Ok(())
    }

    fn prompt_step(&mut self, step: WizardStep, reprompt: &BTreeSet<Field>) -> Result<()> {
        for &field in step.editable_fields() {
            if self.prefilled.has(field) && !reprompt.contains(&field) {
                continue;
            }
            if field == Field::StartAt && self.wizard.draft().schedule != ScheduleMode::Deferred {
                continue;
            }
            // An uploaded installer already filled these.
            if step == WizardStep::Installer
                && self.wizard.effects().upload().result().is_some()
                && !reprompt.contains(&field)
            {
                continue;
            }
            self.prompt_field(field)?;
        }
        Ok(())
    }

    fn prompt_field(&mut self, field: Field) -> Result<()> {
        loop {
            let raw = match field {
                Field::ScheduleMode => {
                    let options = ["Run immediately", "Schedule for later"];
                    let current = usize::from(self.wizard.draft().schedule == ScheduleMode::Deferred);
                    let selection = Select::with_theme(&self.theme)
                        .with_prompt(field.label())
                        .items(&options)
                        .default(current)
                        .interact()?;
                    match selection {
                        0 => ScheduleMode::Immediate.as_str().to_string(),
                        _ => ScheduleMode::Deferred.as_str().to_string(),
                    }
                }
                _ if field.is_secret() => Password::with_theme(&self.theme)
                    .with_prompt(field.label())
                    .allow_empty_password(true)
                    .interact()?,
                _ => {
                    let current = self.wizard.draft().value(field);
                    let mut input = Input::<String>::with_theme(&self.theme)
                        .with_prompt(field.label())
                        .allow_empty(true);
                    if !current.is_empty() {
                        input = input.default(current);
                    }
                    input.interact_text()?
                }
            };

            match self.wizard.set_field(field, &raw) {
                Ok(()) => break,
                Err(message) => writeln!(self.writer, "  {}", style(message).red())?,
            }
        }

        if let Some(message) = validation::validate_field(self.wizard.draft(), field) {
            writeln!(self.writer, "  {}", style(message).yellow())?;
        }
        Ok(())
    }

    fn installer_step(&mut self) -> Result<()> {
        let path = match &self.prefilled.installer_path {
            Some(path) => Some(path.clone()),
            None if self.interactive && !self.prefilled.has(Field::InstallerUrl) => {
                let options = ["Upload an installer file", "Enter an installer URL"];
                let selection = Select::with_theme(&self.theme)
                    .with_prompt("Installer source")
                    .items(&options)
                    .default(0)
                    .interact()?;
                if selection == 0 {
                    let raw: String = Input::with_theme(&self.theme)
                        .with_prompt("Installer file")
                        .interact_text()?;
                    Some(PathBuf::from(raw.trim()))
                } else {
                    None
                }
            }
            None => None,
        };

        let Some(path) = path else {
            return Ok(());
        };

        writeln!(self.writer, "  Uploading {}...", path.display())?;
        self.runtime.block_on(self.wizard.upload_installer(&path));

        let effects = self.wizard.effects();
        if let Some(staged) = effects.upload().result() {
            let status = effects.upload_status().unwrap_or_default();
            writeln!(self.writer, "  {}", style(status).green())?;
            writeln!(
                self.writer,
                "  Package:  {} ({})",
                staged.package_summary(),
                staged.upload.filename
            )?;
        } else if let Some(message) = effects.upload().failure() {
            let message = message.to_string();
            writeln!(self.writer, "  {}", style(message).red())?;
        }
        Ok(())
    }

    fn scan_step(&mut self) -> Result<()> {
        let run = if self.prefilled.scan {
            true
        } else if self.interactive && !self.wizard.draft().parsed_targets().is_empty() {
            Confirm::with_theme(&self.theme)
                .with_prompt("Run an assessment scan on these targets?")
                .default(false)
                .interact()?
        } else {
            false
        };
        if !run {
            return Ok(());
        }

        self.runtime.block_on(self.wizard.run_scan());

        let effects = self.wizard.effects();
        let status = effects.scan_status().unwrap_or_default();
        let result = effects.scan_result().unwrap_or_default();
        if effects.scan().failure().is_some() {
            writeln!(self.writer, "  {}: {}", style(status).red(), result)?;
        } else {
            writeln!(self.writer, "  {}: {}", style(status).green(), result)?;
            if let Some(summary) = effects.scan().result() {
                for issue in summary.issues.clone() {
                    writeln!(self.writer, "    - {}", issue)?;
                }
            }
        }
        Ok(())
    }

    fn print_errors(&mut self, errors: &ValidationErrors) -> Result<()> {
        for (field, message) in errors.iter() {
            writeln!(
                self.writer,
                "  {} {}: {}",
                style("✗").red(),
                field.label(),
                message
            )?;
        }
        Ok(())
    }

    fn print_summary(&mut self) -> Result<()> {
        let draft = self.wizard.draft().clone();
        let targets = draft.parsed_targets();

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", style("  Summary").bold())?;
        writeln!(self.writer, "  ───────────────────────────")?;
        writeln!(self.writer, "  Task:      {}", style(&draft.task_name).green())?;
        writeln!(
            self.writer,
            "  Targets:   {}",
            style(format!("{} ({})", targets.len(), targets.join(", "))).green()
        )?;
        writeln!(
            self.writer,
            "  Level:     {}",
            style(draft.aggressiveness).green()
        )?;
        writeln!(
            self.writer,
            "  Installer: {}",
            style(&draft.installer.url).green()
        )?;
        if !draft.installer.checksum.is_empty() {
            writeln!(self.writer, "  Checksum:  {}", draft.installer.checksum)?;
        }
        let schedule = match draft.schedule {
            ScheduleMode::Immediate => "Immediately".to_string(),
            ScheduleMode::Deferred => format!("At {}", draft.start_at),
        };
        writeln!(self.writer, "  Schedule:  {}", style(schedule).green())?;
        writeln!(self.writer)?;
        Ok(())
    }
}
