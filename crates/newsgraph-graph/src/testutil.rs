//! Test utilities for spinning up a real Neo4j instance via testcontainers.

use testcontainers::{
    core::{ContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};

use crate::{GraphClient, GraphConfig};

/// Directory `LOAD CSV` resolves `file:///` URLs against inside the container.
pub const IMPORT_DIR: &str = "/import";

const PASSWORD: &str = "newsgraph-test";

/// Spin up a Neo4j container with `imports` (file name, contents) placed in
/// its import directory, and return the container handle plus a connected
/// GraphClient.
///
/// The container is stopped when `ContainerAsync` is dropped, so callers must
/// hold it for the duration of the test.
pub async fn neo4j_container(imports: &[(&str, &str)]) -> (ContainerAsync<GenericImage>, GraphClient) {
    let mut request = GenericImage::new("neo4j", "5.26")
        .with_exposed_port(ContainerPort::Tcp(7687))
        .with_wait_for(WaitFor::message_on_stdout("Started."))
        .with_env_var("NEO4J_AUTH", format!("neo4j/{PASSWORD}"))
        .with_env_var("NEO4J_server_directories_import", IMPORT_DIR);

    for (name, contents) in imports {
        request = request.with_copy_to(format!("{IMPORT_DIR}/{name}"), contents.as_bytes().to_vec());
    }

    let container = request
        .start()
        .await
        .expect("Failed to start Neo4j container");

    let host_port = container
        .get_host_port_ipv4(7687)
        .await
        .expect("Failed to get Neo4j host port");

    let config = GraphConfig {
        uri: format!("bolt://127.0.0.1:{host_port}"),
        user: "neo4j".to_string(),
        password: PASSWORD.to_string(),
        database: "neo4j".to_string(),
    };
    let client = GraphClient::connect(&config)
        .await
        .expect("Failed to connect to Neo4j");

    (container, client)
}
