use std::io::Write;

use chrono::NaiveDate;
use stock::{
    DataProvider, Event, FetchController, FormInput, Trigger, ViewState,
    render::ChartSurface,
};
use tracing::debug;

use crate::{command::Command, command::HELP, terminal::TerminalShell};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything the interactive thread owns.
pub struct App<P, S, O, E> {
    controller: FetchController<P, S>,
    view: ViewState,
    form: FormInput,
    shell: TerminalShell<O, E>,
}

impl<P, S, O, E> App<P, S, O, E>
where
    P: DataProvider,
    S: ChartSurface,
    O: Write,
    E: Write,
{
    pub fn new(controller: FetchController<P, S>, shell: TerminalShell<O, E>, today: NaiveDate) -> Self {
        let view = ViewState::new(today);
        let form = view.form();
        Self {
            controller,
            view,
            form,
            shell,
        }
    }

    pub fn shell_mut(&mut self) -> &mut TerminalShell<O, E> {
        &mut self.shell
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn form(&self) -> &FormInput {
        &self.form
    }

    fn fetch(&mut self, trigger: Trigger, today: NaiveDate) {
        if let Err(e) = self.controller.trigger(
            trigger,
            &mut self.form,
            &mut self.view,
            today,
            &mut self.shell,
        ) {
            debug!(error = %e, "fetch not started");
        }
    }

    pub fn start(&mut self, today: NaiveDate) {
        self.fetch(Trigger::Initial, today);
    }

    pub fn on_event(&mut self, event: Event) {
        self.controller.handle(event, &mut self.shell);
    }

    pub fn on_command(&mut self, command: Command, today: NaiveDate) -> Flow {
        match command {
            Command::Symbol(text) => self.form.symbol = text,
            Command::Start(text) => self.form.start = text,
            Command::End(text) => self.form.end = text,
            Command::Interval(text) => self.form.interval = text,
            Command::Range(range) => self.fetch(Trigger::QuickRange(range), today),
            Command::Toggle(ma) => self.fetch(Trigger::ToggleOverlay(ma), today),
            Command::Refresh => {
                if self.shell.refresh_enabled() {
                    self.fetch(Trigger::Refresh, today);
                } else {
                    self.shell.print("a fetch is already running");
                }
            }
            Command::Save(path) => {
                let _ = self.controller.export(&path, &mut self.shell);
            }
            Command::Show => {
                let overlays: Vec<_> = self.view.overlays.iter().map(|ma| ma.label()).collect();
                let summary = format!(
                    "symbol={} start={} end={} interval={} overlays=[{}] phase={}",
                    self.form.symbol,
                    self.form.start,
                    self.form.end,
                    self.form.interval,
                    overlays.join(", "),
                    self.controller.phase(),
                );
                self.shell.print(&summary);
            }
            Command::Help => self.shell.print(HELP),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}
