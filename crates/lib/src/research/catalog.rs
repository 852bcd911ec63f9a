//! Architecture and pattern phrases combined with a term to broaden research.

/// One category of the phrase catalog.
#[derive(Debug, Clone, Copy)]
pub struct PatternCategory {
    pub name: &'static str,
    pub phrases: &'static [&'static str],
}

pub const PATTERN_CATALOG: &[PatternCategory] = &[
    PatternCategory {
        name: "high_availability",
        phrases: &[
            "high availability",
            "redundancy",
            "failover",
            "multi-homing",
            "fault tolerance",
            "MC-LAG",
        ],
    },
    PatternCategory {
        name: "networking",
        phrases: &[
            "VPC",
            "VXLAN EVPN",
            "BGP",
            "leaf spine fabric",
            "underlay overlay",
            "SONiC",
        ],
    },
    PatternCategory {
        name: "orchestration",
        phrases: &[
            "Kubernetes",
            "automation",
            "declarative API",
            "fabric controller",
            "GitOps",
            "zero touch provisioning",
        ],
    },
    PatternCategory {
        name: "security",
        phrases: &[
            "multi-tenancy",
            "isolation",
            "access control",
            "network policy",
            "segmentation",
            "encryption",
        ],
    },
    PatternCategory {
        name: "scaling",
        phrases: &[
            "scale out",
            "horizontal scaling",
            "load balancing",
            "ECMP",
            "capacity planning",
            "edge deployment",
        ],
    },
    PatternCategory {
        name: "observability",
        phrases: &[
            "monitoring",
            "telemetry",
            "metrics",
            "logging",
            "troubleshooting",
            "Grafana dashboards",
        ],
    },
];

/// All catalog phrases in category order.
pub fn all_phrases() -> impl Iterator<Item = &'static str> {
    PATTERN_CATALOG
        .iter()
        .flat_map(|category| category.phrases.iter().copied())
}
