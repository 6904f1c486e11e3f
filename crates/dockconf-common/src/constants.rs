//! Reserved option keys, well-known names, and defaults.

/// Configuration entry key naming the template to instantiate.
pub const TEMPLATE_KEY: &str = "template";

/// Template key naming the parent template(s).
pub const BASED_ON_KEY: &str = "based_on";

/// Default option holding link references to other containers.
pub const DEFAULT_LINKS_KEY: &str = "links";

/// Option carrying the container name passed to the runtime.
pub const NAME_KEY: &str = "name";

/// Option carrying the container image.
pub const IMAGE_KEY: &str = "image";

/// Variable injected into every render context with the entry name.
pub const CONTAINER_NAME_VARIABLE: &str = "CONTAINER_CONFIG_NAME";

/// Pattern of the automation engine's omit marker.
pub const OMIT_PLACEHOLDER_PATTERN: &str = r"__omit_place_holder__[0-9a-f]{40}";

/// Key under which the ordered container records are emitted.
pub const FACTS_KEY: &str = "docker_container_configurations";

/// Default composition document read by the CLI.
pub const DEFAULT_COMPOSITION_FILE: &str = "composition.yml";

/// Application name used in CLI output.
pub const APP_NAME: &str = "dockconf";

/// Parameters understood by the container-management primitive.
///
/// With strict parameter filtering, only these keys are merged from a
/// configuration entry into its template.
pub const CONTAINER_PARAMETERS: &[&str] = &[
    "api_version",
    "auto_remove",
    "blkio_weight",
    "cacert_path",
    "capabilities",
    "cert_path",
    "cleanup",
    "command",
    "cpu_period",
    "cpu_quota",
    "cpu_shares",
    "cpuset_cpus",
    "cpuset_mems",
    "detach",
    "devices",
    "dns_search_domains",
    "dns_servers",
    "docker_host",
    "entrypoint",
    "env",
    "env_file",
    "etc_hosts",
    "exposed_ports",
    "force_kill",
    "groups",
    "hostname",
    "ignore_image",
    "image",
    "interactive",
    "ipc_mode",
    "keep_volumes",
    "kernel_memory",
    "key_path",
    "kill_signal",
    "labels",
    "links",
    "log_driver",
    "log_options",
    "mac_address",
    "memory",
    "memory_reservation",
    "memory_swap",
    "memory_swappiness",
    "name",
    "network_mode",
    "networks",
    "oom_killer",
    "oom_score_adj",
    "paused",
    "pid_mode",
    "privileged",
    "published_ports",
    "pull",
    "purge_networks",
    "read_only",
    "recreate",
    "restart",
    "restart_policy",
    "restart_retries",
    "security_opts",
    "shm_size",
    "ssl_version",
    "state",
    "stop_signal",
    "stop_timeout",
    "sysctls",
    "timeout",
    "tls",
    "tls_hostname",
    "tls_verify",
    "tmpfs",
    "trust_image_content",
    "tty",
    "ulimits",
    "user",
    "uts",
    "volume_driver",
    "volumes",
    "volumes_from",
    "working_dir",
];
