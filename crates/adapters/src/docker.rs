// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Docker container/network inventory probe backing the Docker Topology
//! Intel poller (C10). Shells out to the `docker` CLI rather than linking a
//! Docker Engine API client, matching the teacher's CLI-first adapter style.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DockerError {
    #[error("failed to run docker: {0}")]
    Exec(String),
    #[error("failed to parse docker output: {0}")]
    Parse(String),
}

/// A single container observed by the poller.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    pub status: String,
    pub networks: Vec<String>,
    /// Host-port -> container-port mappings observed on the container.
    pub ports: Vec<(u16, u16)>,
}

#[async_trait]
pub trait DockerProbe: Clone + Send + Sync + 'static {
    /// List all containers currently known to the Docker daemon.
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, DockerError>;

    /// Networks the named container participates in.
    async fn container_networks(&self, name: &str) -> Result<Vec<String>, DockerError>;
}

/// Real probe, shelling out to `docker ps` / `docker inspect`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemDockerProbe;

impl SystemDockerProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DockerProbe for SystemDockerProbe {
    async fn list_containers(&self) -> Result<Vec<ContainerInfo>, DockerError> {
        let output = tokio::process::Command::new("docker")
            .args(["ps", "--format", "{{.ID}}|{{.Names}}|{{.Image}}|{{.Status}}"])
            .output()
            .await
            .map_err(|e| DockerError::Exec(e.to_string()))?;

        if !output.status.success() {
            return Err(DockerError::Exec(String::from_utf8_lossy(&output.stderr).to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let mut containers = Vec::new();
        for line in stdout.lines() {
            let mut parts = line.splitn(4, '|');
            let (Some(id), Some(name), Some(image), Some(status)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            let networks = self.container_networks(name).await.unwrap_or_default();
            containers.push(ContainerInfo {
                id: id.to_string(),
                name: name.to_string(),
                image: image.to_string(),
                status: status.to_string(),
                networks,
                ports: Vec::new(),
            });
        }
        Ok(containers)
    }

    async fn container_networks(&self, name: &str) -> Result<Vec<String>, DockerError> {
        let output = tokio::process::Command::new("docker")
            .args([
                "inspect",
                "--format",
                "{{range $k, $v := .NetworkSettings.Networks}}{{$k}} {{end}}",
                name,
            ])
            .output()
            .await
            .map_err(|e| DockerError::Exec(e.to_string()))?;

        if !output.status.success() {
            return Err(DockerError::Parse(format!("no such container: {name}")));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.split_whitespace().map(str::to_string).collect())
    }
}

#[cfg(test)]
#[path = "docker_tests.rs"]
mod tests;
