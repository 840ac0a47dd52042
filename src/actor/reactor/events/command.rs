use tracing::{debug, info};

use crate::actor::broadcast::BroadcastEvent;
use crate::actor::reactor::{Reactor, ReactorCommand, ReactorError};
use crate::common::config::Config;
use crate::model::Role;
use crate::sys::window_system::WindowSystem;

pub struct CommandEventHandler;

impl CommandEventHandler {
    pub fn handle_command<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        cmd: ReactorCommand,
    ) -> Result<(), ReactorError> {
        info!(?cmd);
        match cmd {
            ReactorCommand::CycleNext => reactor.cycle_next(),
            ReactorCommand::CyclePrev => reactor.cycle_prev(),
            ReactorCommand::Promote(wid) => {
                if !matches!(reactor.registry.role(wid), Some(Role::Main | Role::Card)) {
                    debug!(?wid, "promote of a window outside the layout - ignoring");
                    return Ok(());
                }
                reactor.promote_to_main(wid)?;
                reactor.window_system.focus(wid);
                Ok(())
            }
            ReactorCommand::Redetermine => reactor.redetermine_layout(),
        }
    }

    /// Swaps in a new configuration and re-applies geometry for the current
    /// roles.
    pub fn handle_config_updated<W: WindowSystem>(
        reactor: &mut Reactor<W>,
        config: Config,
    ) -> Result<(), ReactorError> {
        if reactor.config == config {
            debug!("configuration unchanged");
            return Ok(());
        }
        info!("applying new configuration");
        reactor.config = config;
        reactor.notify(BroadcastEvent::ThemeSelected {
            name: reactor.config.settings.theme.clone(),
        });
        reactor.apply_full_layout()
    }
}
