// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Pinned versions, namespaces and URLs for the cluster and its add-ons

/// Application name shown in usage output
pub const APP_NAME: &str = "homeserver";

/// Default host paths prepended to PATH for external tools (Homebrew locations)
pub const DEFAULT_EXTRA_PATH: &[&str] = &["/usr/local/bin", "/opt/homebrew/bin"];

/// PATH used when the caller has none
pub const FALLBACK_SYSTEM_PATH: &[&str] = &["/usr/bin", "/bin"];

/// Polling configuration shared by every wait loop
pub mod poll {
    use std::time::Duration;

    /// Fixed interval between readiness checks
    pub const INTERVAL: Duration = Duration::from_secs(10);
    /// Default pod readiness budget for add-ons
    pub const POD_READY_TIMEOUT: Duration = Duration::from_secs(3 * 60);
}

/// Colima VM and bundled K3s
pub mod colima {
    use std::time::Duration;

    pub const PROFILE: &str = "k3s-homeserver";
    pub const CPUS: u32 = 4;
    pub const MEMORY_GIB: u32 = 8;
    pub const RUNTIME: &str = "containerd";
    pub const NETWORK_MODE: &str = "bridged";
    pub const NETWORK_INTERFACE: &str = "en1";
    pub const START_TIMEOUT: Duration = Duration::from_secs(10 * 60);
    /// Ceiling for the Kubernetes API to answer after the VM started
    pub const K3S_READY_TIMEOUT: Duration = Duration::from_secs(180);
}

/// Bundled Traefik ingress that conflicts with ingress-nginx
pub mod traefik {
    pub const NAMESPACE: &str = "traefik-system";
    pub const INGRESS_CLASS: &str = "traefik";
}

/// Node label key carrying the environment label
pub const ENV_LABEL_KEY: &str = "env";
/// Environment label used when the operator leaves the prompt blank
pub const DEFAULT_ENV_LABEL: &str = "dev";

/// Field manager name used for server-side apply
pub const FIELD_MANAGER: &str = "homeserver";

pub mod metrics_server {
    pub const MANIFEST_URL: &str =
        "https://github.com/kubernetes-sigs/metrics-server/releases/latest/download/components.yaml";
}

pub mod helm {
    use std::time::Duration;

    pub const INSTALLER_URL: &str =
        "https://raw.githubusercontent.com/helm/helm/main/scripts/get-helm-3";
    /// Installer script written to the working directory and removed after use
    pub const INSTALLER_FILE: &str = "get_helm.sh";
    pub const INSTALLER_TIMEOUT: Duration = Duration::from_secs(5 * 60);
    /// Helm configuration and cache directories, relative to the home directory
    pub const HOME_DIRS: &[&str] = &[".helm", ".config/helm", ".cache/helm", "Library/Caches/helm"];
    /// User-local binary location, relative to the home directory
    pub const HOME_BINARY: &str = ".local/bin/helm";
    /// System-wide binary locations the installer may have used
    pub const SYSTEM_BINARIES: &[&str] = &["/usr/local/bin/helm", "/opt/homebrew/bin/helm"];
}

/// Per-user state removed on uninstall, relative to the home directory
pub mod cleanup {
    pub const KUBE_DIR: &str = ".kube";
    pub const COLIMA_DIR: &str = ".colima";
}

pub mod metallb {
    pub const VERSION: &str = "0.15.2";
    pub const NAMESPACE: &str = "metallb-system";
    pub const SELECTOR: &str = "app=metallb";
    pub const NAMESPACE_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-metallb/resources/namespace.yaml";
    pub const IP_CONFIG_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-metallb/resources/ipconfig.yaml";

    pub fn manifest_url() -> String {
        format!(
            "https://raw.githubusercontent.com/metallb/metallb/v{}/config/manifests/metallb-native.yaml",
            VERSION
        )
    }
}

pub mod ingress {
    use std::time::Duration;

    pub const VERSION: &str = "4.13.3";
    pub const REPO_NAME: &str = "ingress-nginx";
    pub const REPO_URL: &str = "https://kubernetes.github.io/ingress-nginx";
    pub const NAMESPACE: &str = "ingress-nginx";
    pub const RELEASE: &str = "ingress-nginx";
    pub const CHART: &str = "ingress-nginx/ingress-nginx";
    pub const SERVICE: &str = "ingress-nginx-controller";
    pub const SELECTOR: &str = "app.kubernetes.io/name=ingress-nginx";
    /// Fixed external address requested from the load balancer
    pub const LOAD_BALANCER_IP: &str = "192.168.0.180";
    /// Substring expected in the `Server` header of controller responses
    pub const SERVER_HEADER: &str = "nginx";
    pub const ADDRESS_TIMEOUT: Duration = Duration::from_secs(5 * 60);
    pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DIAGNOSTIC_TIMEOUT: Duration = Duration::from_secs(30);
}

pub mod eso {
    pub const VERSION: &str = "0.20.2";
    pub const REPO_NAME: &str = "external-secrets";
    pub const REPO_URL: &str = "https://charts.external-secrets.io";
    pub const NAMESPACE: &str = "external-secrets";
    pub const RELEASE: &str = "external-secrets";
    pub const CHART: &str = "external-secrets/external-secrets";
    /// Secret referenced by the ClusterSecretStore
    pub const TOKEN_SECRET: &str = "gitlab-eso-secret";
    pub const TOKEN_KEY: &str = "token";
    pub const CLUSTER_SECRET_STORE_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/app-clustersecrets/resources/gitlab-clustersecretstore.yaml";
}

pub mod cert_manager {
    pub const VERSION: &str = "1.18.2";
    pub const NAMESPACE: &str = "cert-manager";
    pub const SELECTOR: &str = "app.kubernetes.io/instance=cert-manager";
    pub const ROUTE53_SECRET_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-cert-manager/resources/route53-secret.yaml";
    pub const CLUSTER_ISSUER_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-cert-manager/resources/cluster-issuer.yaml";

    pub fn manifest_url() -> String {
        format!(
            "https://github.com/cert-manager/cert-manager/releases/download/v{}/cert-manager.yaml",
            VERSION
        )
    }
}

pub mod argocd {
    pub const VERSION: &str = "8.5.8";
    pub const REPO_NAME: &str = "argo";
    pub const REPO_URL: &str = "https://argoproj.github.io/argo-helm";
    pub const NAMESPACE: &str = "argo-project";
    pub const RELEASE: &str = "argocd";
    pub const CHART: &str = "argo/argo-cd";
    pub const SELECTOR: &str = "app.kubernetes.io/name=argocd-server";
    pub const OAUTH_SECRET_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-argocd/resources/oauth-secret.yaml";
    pub const VALUES_URL: &str = "https://raw.githubusercontent.com/BeaverHouse/hybrid-cicd/refs/heads/main/charts/oss-argocd/values.yaml";
}
