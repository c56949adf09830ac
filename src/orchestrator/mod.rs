use thiserror::Error;
use tracing::{debug, info, warn};

use crate::audit::AuditLog;
use crate::containers::ContainerScanner;
use crate::executor::CommandExecutor;
use crate::firewall::{FirewallError, FirewalldManager, RichRule};
use crate::port::PortSpec;
use crate::selinux::{LabelAction, PortLabelMapping, SelinuxError, SelinuxManager};

/// Port types shown by `list`. A display convenience for the common services,
/// not a completeness guarantee - other mapped types exist and are not shown.
pub const WELL_KNOWN_TYPES: &[&str] = &[
    "ssh_port_t",
    "http_port_t",
    "http_cache_port_t",
    "mysqld_port_t",
    "postgresql_port_t",
    "redis_port_t",
];

#[derive(Debug, Error)]
pub enum OrchestrateError {
    #[error("{0}")]
    Firewall(#[from] FirewallError),

    #[error("{0}")]
    Selinux(#[from] SelinuxError),
}

pub type OrchestrateResult<T> = Result<T, OrchestrateError>;

/// Everything one invocation asked for, fixed up front. Replaces what used to
/// be process-wide mutable state with a value threaded through the run.
#[derive(Debug, Clone)]
pub struct Request {
    pub ports: Vec<PortSpec>,
    pub zone: Option<String>,
    pub source: Option<String>,
    pub se_type: Option<String>,
    pub keep_selinux: bool,
    pub dry_run: bool,
}

impl Request {
    fn zone_label(&self) -> &str {
        self.zone.as_deref().unwrap_or("default")
    }
}

/// Snapshot assembled for the `list` command.
#[derive(Debug)]
pub struct ListReport {
    pub zone_label: String,
    pub ports: Vec<String>,
    pub rich_rules: Vec<String>,
    pub mappings: Vec<PortLabelMapping>,
}

/// Sequences the firewall, label and container subsystems per requested port,
/// in a fixed order: firewall mutation, reload, label reconciliation,
/// container advisory. Fail-fast, no rollback of already-applied steps.
pub struct Orchestrator<'a> {
    executor: &'a mut (dyn CommandExecutor + Send),
    request: Request,
    audit: AuditLog,
}

impl<'a> Orchestrator<'a> {
    pub fn new(executor: &'a mut (dyn CommandExecutor + Send), request: Request) -> Self {
        Self {
            executor,
            request,
            audit: AuditLog::default(),
        }
    }

    pub fn with_audit(
        executor: &'a mut (dyn CommandExecutor + Send),
        request: Request,
        audit: AuditLog,
    ) -> Self {
        Self {
            executor,
            request,
            audit,
        }
    }

    /// Environment prerequisites, checked before any mutation.
    async fn preflight(&mut self) -> OrchestrateResult<()> {
        let mut firewall = FirewalldManager::new(
            &mut *self.executor,
            self.request.zone.clone(),
            self.request.dry_run,
        );
        firewall.ensure_running().await?;

        if self.request.se_type.is_some() {
            let mut selinux = SelinuxManager::new(&mut *self.executor, self.request.dry_run);
            selinux.ensure_tooling().await?;
        }
        Ok(())
    }

    pub async fn open(&mut self) -> OrchestrateResult<()> {
        self.preflight().await?;

        let ports = self.request.ports.clone();
        let se_type = self.request.se_type.clone();

        for spec in &ports {
            self.open_firewall(spec).await?;
            if let Some(se_type) = &se_type {
                self.reconcile_label_add(se_type, spec).await?;
            }
            self.advise_container_collisions(spec).await;
        }
        Ok(())
    }

    pub async fn close(&mut self) -> OrchestrateResult<()> {
        self.preflight().await?;

        let ports = self.request.ports.clone();
        let se_type = self.request.se_type.clone();

        for spec in &ports {
            self.close_firewall(spec).await?;
            if let Some(se_type) = &se_type {
                if self.request.keep_selinux {
                    info!("Keeping SELinux mapping {} -> {}", spec, se_type);
                    self.audit
                        .record(&format!("kept selinux mapping {} -> {}", spec, se_type));
                } else {
                    self.reconcile_label_remove(se_type, spec).await?;
                }
            }
            // No container advisory on close: the collision risk exists when
            // traffic is newly admitted, not when access is revoked.
        }
        Ok(())
    }

    pub async fn list(&mut self) -> OrchestrateResult<ListReport> {
        let mut firewall = FirewalldManager::new(
            &mut *self.executor,
            self.request.zone.clone(),
            self.request.dry_run,
        );
        firewall.ensure_running().await?;
        let zone_label = match &self.request.zone {
            Some(zone) => zone.clone(),
            None => firewall.default_zone().await?,
        };
        let ports = firewall.list_ports().await?;
        let rich_rules = firewall.list_rich_rules().await?;

        let mut selinux = SelinuxManager::new(&mut *self.executor, self.request.dry_run);
        let mappings = match selinux.ensure_tooling().await {
            Ok(()) => selinux
                .list_mappings()
                .await?
                .into_iter()
                .filter(|m| WELL_KNOWN_TYPES.contains(&m.se_type.as_str()))
                .collect(),
            Err(SelinuxError::MissingSemanage) => {
                debug!("semanage not available, listing firewall state only");
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(ListReport {
            zone_label,
            ports,
            rich_rules,
            mappings,
        })
    }

    async fn open_firewall(&mut self, spec: &PortSpec) -> OrchestrateResult<()> {
        let zone = self.request.zone_label().to_string();
        let source = self.request.source.clone();
        let dry = self.request.dry_run;

        let action = match &source {
            Some(cidr) => format!("open {} source {} zone {}", spec, cidr, zone),
            None => format!("open {} zone {}", spec, zone),
        };

        let mutation = {
            let mut firewall =
                FirewalldManager::new(&mut *self.executor, self.request.zone.clone(), dry);
            let applied = match &source {
                Some(cidr) => firewall.add_rich_rule(&RichRule::new(cidr, *spec)).await,
                None => firewall.add_port(spec).await,
            };
            match applied {
                Ok(()) => firewall.reload().await,
                Err(e) => Err(e),
            }
        };

        // The attempt is part of the after-the-fact record either way: there
        // is no rollback, so a failure can still leave earlier steps applied.
        if let Err(e) = mutation {
            self.audit
                .record(&format!("{}{} failed: {}", self.dry_prefix(), action, e));
            return Err(e.into());
        }

        match &source {
            Some(cidr) => info!("Opened {} from {} in zone {}", spec, cidr, zone),
            None => info!("Opened {} in zone {}", spec, zone),
        }
        self.audit
            .record(&format!("{}{}", self.dry_prefix(), action));
        Ok(())
    }

    async fn close_firewall(&mut self, spec: &PortSpec) -> OrchestrateResult<()> {
        let zone = self.request.zone_label().to_string();
        let source = self.request.source.clone();
        let dry = self.request.dry_run;

        let action = format!("close {} zone {}", spec, zone);

        let mutation = {
            let mut firewall =
                FirewalldManager::new(&mut *self.executor, self.request.zone.clone(), dry);
            let applied = match &source {
                Some(cidr) => {
                    // Regenerated identically to the rule used on open, so the
                    // removal matches exactly.
                    let rule = RichRule::new(cidr, *spec);
                    firewall.remove_rich_rule(&rule).await
                }
                None => firewall.remove_port(spec).await,
            };
            match applied {
                Ok(()) => firewall.reload().await,
                Err(e) => Err(e),
            }
        };

        if let Err(e) = mutation {
            self.audit
                .record(&format!("{}{} failed: {}", self.dry_prefix(), action, e));
            return Err(e.into());
        }

        info!("Closed {} in zone {}", spec, zone);
        self.audit
            .record(&format!("{}{}", self.dry_prefix(), action));
        Ok(())
    }

    async fn reconcile_label_add(&mut self, se_type: &str, spec: &PortSpec) -> OrchestrateResult<()> {
        let dry = self.request.dry_run;
        let result = {
            let mut selinux = SelinuxManager::new(&mut *self.executor, dry);
            selinux.reconcile_add(se_type, spec).await
        };
        let action = match result {
            Ok(action) => action,
            Err(e) => {
                self.audit.record(&format!(
                    "{}selinux map {} -> {} failed: {}",
                    self.dry_prefix(),
                    spec,
                    se_type,
                    e
                ));
                return Err(e.into());
            }
        };

        match action {
            LabelAction::Add => {
                info!("Labeled {} as {} (new type association)", spec, se_type);
                self.audit.record(&format!(
                    "{}selinux map {} -> {} (new)",
                    self.dry_prefix(),
                    spec,
                    se_type
                ));
            }
            LabelAction::Modify => {
                info!("Labeled {} as {} (extended existing type)", spec, se_type);
                self.audit.record(&format!(
                    "{}selinux map {} -> {} (extended)",
                    self.dry_prefix(),
                    spec,
                    se_type
                ));
            }
            LabelAction::Noop => {
                debug!("{} already labeled {}", spec, se_type);
            }
            LabelAction::Delete => {}
        }
        Ok(())
    }

    async fn reconcile_label_remove(
        &mut self,
        se_type: &str,
        spec: &PortSpec,
    ) -> OrchestrateResult<()> {
        let dry = self.request.dry_run;
        let result = {
            let mut selinux = SelinuxManager::new(&mut *self.executor, dry);
            selinux.reconcile_remove(se_type, spec).await
        };
        let action = match result {
            Ok(action) => action,
            Err(e) => {
                self.audit.record(&format!(
                    "{}selinux unmap {} -> {} failed: {}",
                    self.dry_prefix(),
                    spec,
                    se_type,
                    e
                ));
                return Err(e.into());
            }
        };

        if action == LabelAction::Delete {
            info!("Removed SELinux mapping {} -> {}", spec, se_type);
            self.audit.record(&format!(
                "{}selinux unmap {} -> {}",
                self.dry_prefix(),
                spec,
                se_type
            ));
        } else {
            debug!("No SELinux mapping {} -> {} to remove", spec, se_type);
        }
        Ok(())
    }

    /// Informational only: a matching published port never fails the run.
    async fn advise_container_collisions(&mut self, spec: &PortSpec) {
        let hits = {
            let mut scanner = ContainerScanner::new(&mut *self.executor);
            match scanner.scan(spec).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!("Container check for {} failed: {}", spec, e);
                    return;
                }
            }
        };

        for hit in &hits {
            warn!(
                "{} is already published by {} container '{}' ({})",
                spec, hit.engine, hit.container_name, hit.binding_text
            );
            self.audit.record(&format!(
                "notice: {} published by {} container '{}' ({})",
                spec, hit.engine, hit.container_name, hit.binding_text
            ));
        }
    }

    fn dry_prefix(&self) -> &'static str {
        if self.request.dry_run {
            "(dry-run) "
        } else {
            ""
        }
    }
}
