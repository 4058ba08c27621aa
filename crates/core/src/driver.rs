//! Container fixture lifecycle
//!
//! [`DockerDriver`] launches one container, discovers the host ports the
//! runtime assigned to it, publishes everything it learned into a
//! [`PublishedEnv`], and owns the stop action for that container.
//!
//! ## Published variables
//!
//! | Key | Value |
//! |-----|-------|
//! | `IMAGE` | configured image reference |
//! | `CONTAINER_ID` | identifier printed by `run` |
//! | `CONTAINER_PORTS` | raw `{{.Ports}}` summary |
//! | `RAW_PORT_<i>`, `PORT_TYPE_<i>`, `BIND_<i>`, `PORT_EXPOSED_<i>`, `PORT_<i>` | per binding |
//! | `RAW_PORT`, `PORT_TYPE`, `BIND`, `PORT_EXPOSED`, `PORT`, `URL` | primary binding |

use crate::cleanup::CleanupStack;
use crate::config::DriverConfig;
use crate::env::{self, PublishedEnv};
use crate::errors::{FixtureError, Result};
use crate::ports::{PortBinding, PortTable};
use crate::runtime::ContainerRuntime;
use tracing::{debug, info, instrument};

/// Lifecycle manager for a single container fixture
#[derive(Debug)]
pub struct DockerDriver<R> {
    config: DriverConfig,
    runtime: R,
    env: PublishedEnv,
    container_id: Option<String>,
    raw_ports: Option<String>,
    ports: PortTable,
    port: Option<String>,
    url: Option<String>,
    cleanups: CleanupStack,
}

impl<R> DockerDriver<R>
where
    R: ContainerRuntime + Clone + 'static,
{
    pub fn new(config: DriverConfig, runtime: R) -> Self {
        Self {
            config,
            runtime,
            env: PublishedEnv::new(),
            container_id: None,
            raw_ports: None,
            ports: PortTable::default(),
            port: None,
            url: None,
            cleanups: CleanupStack::new(),
        }
    }

    /// Launch the container and publish its endpoints.
    ///
    /// Steps run strictly in order and the first failure aborts the rest.
    /// Variables published before the failure stay in [`Self::env`]. Once
    /// the container is launched its stop action is registered, so a later
    /// failure still stops it on [`Self::teardown`] or drop.
    #[instrument(skip(self), fields(image = %self.config.image()))]
    pub fn setup(&mut self) -> Result<()> {
        if self.container_id.is_some() {
            return Err(FixtureError::Launch {
                message: "container already launched by this fixture".to_string(),
            });
        }
        self.config.validate()?;

        self.env.put(env::IMAGE, self.config.image());

        let container_id = self.launch()?;
        info!("Started container {} from {}", container_id, self.config.image());
        self.container_id = Some(container_id.clone());
        self.env.put(env::CONTAINER_ID, container_id.as_str());
        self.register_stop(container_id.clone());

        let raw_ports = self
            .runtime
            .container_ports(&container_id)
            .map_err(|e| FixtureError::Query {
                container_id: container_id.clone(),
                message: e.to_string(),
            })?;
        self.env.put(env::CONTAINER_PORTS, raw_ports.as_str());

        let ports = PortTable::parse(&raw_ports);
        self.raw_ports = Some(raw_ports);
        self.publish_ports(ports);

        Ok(())
    }

    fn launch(&self) -> Result<String> {
        let stdout = self
            .runtime
            .run_container(self.config.image(), self.config.args())
            .map_err(|e| FixtureError::Launch {
                message: e.to_string(),
            })?;

        let container_id = stdout.trim();
        if container_id.is_empty() {
            return Err(FixtureError::Launch {
                message: format!(
                    "{} run printed no container identifier",
                    self.runtime.runtime_name()
                ),
            });
        }
        Ok(container_id.to_string())
    }

    fn register_stop(&mut self, container_id: String) {
        let runtime = self.runtime.clone();
        let label = format!("{} stop {}", runtime.runtime_name(), container_id);

        self.cleanups.push(label, move || {
            debug!("Stopping container {}", container_id);
            runtime
                .stop_container(&container_id)
                .map_err(|e| FixtureError::Cleanup {
                    container_id: container_id.clone(),
                    message: e.to_string(),
                })
        });
    }

    fn publish_ports(&mut self, ports: PortTable) {
        for binding in ports.iter() {
            self.env.extend(binding.env_entries(Some(binding.index)));
        }

        if let Some(primary) = ports.primary() {
            let url = primary.url(self.runtime.runtime_name());
            debug!("Primary port binding {}: {}", primary.index, url);

            self.env.extend(primary.env_entries(None));
            self.env.put(env::URL, url.as_str());
            self.port = Some(primary.published_port.clone());
            self.url = Some(url);
        } else {
            debug!("Container exposes no parseable port bindings");
        }

        self.ports = ports;
    }

    /// Run the registered cleanup actions now.
    ///
    /// Calling this more than once is harmless; each action runs once.
    pub fn teardown(&mut self) -> Result<()> {
        self.cleanups.run_all()
    }
}

impl<R> DockerDriver<R> {
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Variables published so far
    pub fn env(&self) -> &PublishedEnv {
        &self.env
    }

    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref()
    }

    /// The unparsed port summary reported by the runtime
    pub fn raw_ports(&self) -> Option<&str> {
        self.raw_ports.as_deref()
    }

    pub fn ports(&self) -> &PortTable {
        &self.ports
    }

    /// Binding parsed from segment `index` of the port summary
    pub fn port_binding(&self, index: usize) -> Option<&PortBinding> {
        self.ports.get(index)
    }

    /// Published host port of the primary binding
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    /// Connection URL of the primary binding
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Number of cleanup actions that have not run yet
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups.len()
    }
}
