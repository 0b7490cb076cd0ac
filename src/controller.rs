use crate::controls::{self, ControlCommand};
use crate::log_view::LogView;
use crate::poller;
use crate::render::RenderSink;
use crate::scheduler::{PollScheduler, RefreshRate};
use crate::session::SessionClient;
use log::{info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Owns one log view together with its scheduler and applies user controls
/// to it. The view counts as visible while the scheduler is running.
pub struct LogController<S: RenderSink + 'static> {
    client: SessionClient,
    view: Arc<Mutex<LogView<S>>>,
    scheduler: PollScheduler,
}

impl<S: RenderSink + 'static> LogController<S> {
    pub fn new(client: SessionClient, view: LogView<S>, scheduler: PollScheduler) -> Self {
        Self {
            client,
            view: Arc::new(Mutex::new(view)),
            scheduler,
        }
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Enters the log view: reloads the server directory and (re)starts polling.
    pub async fn activate(&mut self) {
        match poller::refresh_servers(&self.client, &self.view).await {
            Ok(0) => warn!("Dashboard reports no configured servers"),
            Ok(_) => {}
            Err(e) => warn!("Could not load server list: {}", e),
        }

        let client = self.client.clone();
        let view = Arc::clone(&self.view);
        self.scheduler
            .start(move || poller::run_cycle(client.clone(), Arc::clone(&view)));
    }

    /// Leaves the log view. Cycles already in flight still complete.
    pub fn deactivate(&mut self) {
        self.scheduler.stop();
    }

    fn fetch_now(&self) {
        tokio::spawn(poller::run_cycle(self.client.clone(), Arc::clone(&self.view)));
    }

    /// Stops polling once the shared credential is gone. Returns `true` when
    /// the session was lost.
    pub fn on_session_change(&mut self) -> bool {
        if self.client.session().is_authenticated() {
            return false;
        }

        self.deactivate();
        true
    }

    /// Applies one control. Returns `false` when the user asked to quit.
    pub async fn handle(&mut self, command: ControlCommand) -> bool {
        match command {
            ControlCommand::SetCategory(category) => {
                self.view.lock().await.set_category(category);
                info!("Log category set to: {}", category);
                self.refetch_if_active();
            }

            ControlCommand::SetServerScope(scope) => {
                info!("Server scope set to: {}", scope);
                self.view.lock().await.set_server_scope(scope);
                self.refetch_if_active();
            }

            ControlCommand::ListServers => {
                let view = self.view.lock().await;
                let names: Vec<String> = view
                    .server_scope_options()
                    .iter()
                    .map(|scope| scope.to_string())
                    .collect();
                println!("servers: {} (showing: {})", names.join(", "), view.criteria().server_scope);
            }

            ControlCommand::ToggleRate => {
                let rate = self.scheduler.rate().toggled();
                self.change_rate(rate).await;
            }

            ControlCommand::SetRate(rate) => self.change_rate(rate).await,

            ControlCommand::Clear => {
                let cutoff = self.view.lock().await.clear();
                info!("Log view cleared at {}", cutoff);
            }

            ControlCommand::Refresh => {
                self.fetch_now();
            }

            ControlCommand::Show => {
                if !self.is_active() {
                    self.activate().await;
                }
            }

            ControlCommand::Hide => self.deactivate(),

            ControlCommand::Help => println!("{}", controls::HELP),

            ControlCommand::Quit => return false,
        }

        true
    }

    fn refetch_if_active(&self) {
        if self.is_active() {
            self.fetch_now();
        }
    }

    async fn change_rate(&mut self, rate: RefreshRate) {
        let was_active = self.is_active();
        self.scheduler.set_rate(rate);
        info!("Auto-refresh cadence: {} ({:?})", rate.label(), self.scheduler.interval());

        // the scheduler never restarts itself
        if was_active {
            self.activate().await;
        }
    }
}
