//! Exit Code Taxonomy
//!
//! A closed enumeration of process outcomes shared by every tool that reports
//! an exit status, plus versioned tables that collapse the full taxonomy into
//! a handful of [`SimplifiedMode`] buckets.
//!
//! Numeric values are stable once published: new codes may be added, but a
//! value is never reused for a different outcome. Bucket assignment is a
//! separate, versioned policy (see [`taxonomy`]).
//!
//! ```text
//! 0-1      standard
//! 10-19    networking
//! 20-29    configuration
//! 30-39    runtime
//! 40-49    usage (plus 64, BSD EX_USAGE)
//! 50-59    permissions
//! 60-69    data
//! 70-79    security
//! 80-89    observability
//! 91-99    testing
//! 128-165  signals (128 + signal number, Linux numbering)
//! ```

pub mod simplified;
pub mod taxonomy;

pub use simplified::{MappingData, MappingSpec, SimplifiedMode};
pub use taxonomy::{ExitCodeInfo, ExitCodeTaxonomy, Reclassification};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RegistryError;

/// Version of the code set itself, independent of mapping versions
pub const EXIT_CODES_VERSION: &str = "v1.0.0";

/// Retry guidance attached to some exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryHint {
    Retry,
    NoRetry,
    Investigate,
}

impl RetryHint {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryHint::Retry => "retry",
            RetryHint::NoRetry => "no_retry",
            RetryHint::Investigate => "investigate",
        }
    }
}

/// Grouping of exit codes by numeric range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCodeCategory {
    Standard,
    Networking,
    Configuration,
    Runtime,
    Usage,
    Permissions,
    Data,
    Security,
    Observability,
    Testing,
    Signals,
}

impl ExitCodeCategory {
    pub const ALL: [ExitCodeCategory; 11] = [
        ExitCodeCategory::Standard,
        ExitCodeCategory::Networking,
        ExitCodeCategory::Configuration,
        ExitCodeCategory::Runtime,
        ExitCodeCategory::Usage,
        ExitCodeCategory::Permissions,
        ExitCodeCategory::Data,
        ExitCodeCategory::Security,
        ExitCodeCategory::Observability,
        ExitCodeCategory::Testing,
        ExitCodeCategory::Signals,
    ];

    /// Category ID (e.g. "networking")
    pub fn id(&self) -> &'static str {
        match self {
            ExitCodeCategory::Standard => "standard",
            ExitCodeCategory::Networking => "networking",
            ExitCodeCategory::Configuration => "configuration",
            ExitCodeCategory::Runtime => "runtime",
            ExitCodeCategory::Usage => "usage",
            ExitCodeCategory::Permissions => "permissions",
            ExitCodeCategory::Data => "data",
            ExitCodeCategory::Security => "security",
            ExitCodeCategory::Observability => "observability",
            ExitCodeCategory::Testing => "testing",
            ExitCodeCategory::Signals => "signals",
        }
    }

    /// Declared numeric range, inclusive
    pub fn range(&self) -> (i32, i32) {
        match self {
            ExitCodeCategory::Standard => (0, 1),
            ExitCodeCategory::Networking => (10, 19),
            ExitCodeCategory::Configuration => (20, 29),
            ExitCodeCategory::Runtime => (30, 39),
            ExitCodeCategory::Usage => (40, 49),
            ExitCodeCategory::Permissions => (50, 59),
            ExitCodeCategory::Data => (60, 69),
            ExitCodeCategory::Security => (70, 79),
            ExitCodeCategory::Observability => (80, 89),
            ExitCodeCategory::Testing => (91, 99),
            ExitCodeCategory::Signals => (128, 165),
        }
    }
}

impl fmt::Display for ExitCodeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ExitCodeCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.id() == s)
            .ok_or_else(|| format!("unknown exit code category: {s}"))
    }
}

/// Static metadata of one exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExitCodeMetadata {
    pub code: i32,
    pub name: &'static str,
    pub category: ExitCodeCategory,
    pub description: &'static str,
    pub context: &'static str,
    pub retry_hint: Option<RetryHint>,
    /// BSD `sysexits.h` equivalent, if any
    pub bsd_equivalent: Option<&'static str>,
}

macro_rules! optional {
    () => {
        None
    };
    ($value:expr) => {
        Some($value)
    };
}

macro_rules! exit_codes {
    (
        $(
            $variant:ident = $code:literal {
                name: $name:literal,
                category: $category:ident,
                description: $description:literal,
                context: $context:literal
                $(, retry: $retry:ident)?
                $(, bsd: $bsd:literal)?
                $(,)?
            }
        ),+ $(,)?
    ) => {
        /// Standardized exit codes.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[repr(i32)]
        pub enum ExitCode {
            $(
                #[doc = $description]
                $variant = $code,
            )+
        }

        impl ExitCode {
            /// Every exit code, ascending by numeric value
            pub const ALL: &'static [ExitCode] = &[$(ExitCode::$variant),+];

            /// Static metadata for this code
            pub fn info(self) -> &'static ExitCodeMetadata {
                match self {
                    $(
                        ExitCode::$variant => {
                            static INFO: ExitCodeMetadata = ExitCodeMetadata {
                                code: $code,
                                name: $name,
                                category: ExitCodeCategory::$category,
                                description: $description,
                                context: $context,
                                retry_hint: optional!($(RetryHint::$retry)?),
                                bsd_equivalent: optional!($($bsd)?),
                            };
                            &INFO
                        }
                    )+
                }
            }
        }
    };
}

exit_codes! {
    Success = 0 {
        name: "EXIT_SUCCESS",
        category: Standard,
        description: "Successful execution",
        context: "Command completed without errors",
    },
    Failure = 1 {
        name: "EXIT_FAILURE",
        category: Standard,
        description: "Generic failure (unspecified error)",
        context: "Use when no more specific exit code applies",
    },
    PortInUse = 10 {
        name: "EXIT_PORT_IN_USE",
        category: Networking,
        description: "Specified port is already in use",
        context: "Server startup when port unavailable and fail_if_unavailable strategy",
    },
    PortRangeExhausted = 11 {
        name: "EXIT_PORT_RANGE_EXHAUSTED",
        category: Networking,
        description: "No available ports in configured range",
        context: "Server startup when all ports in environment range occupied",
    },
    InstanceAlreadyRunning = 12 {
        name: "EXIT_INSTANCE_ALREADY_RUNNING",
        category: Networking,
        description: "Another instance already running on target port",
        context: "Server startup when PID registry shows active process on port",
    },
    NetworkUnreachable = 13 {
        name: "EXIT_NETWORK_UNREACHABLE",
        category: Networking,
        description: "Network destination unreachable",
        context: "Client connections, health checks, external service validation",
    },
    ConnectionRefused = 14 {
        name: "EXIT_CONNECTION_REFUSED",
        category: Networking,
        description: "Connection refused by remote host",
        context: "Database connections, API endpoints, upstream services",
    },
    ConnectionTimeout = 15 {
        name: "EXIT_CONNECTION_TIMEOUT",
        category: Networking,
        description: "Connection attempt timed out",
        context: "Slow networks, unresponsive services, firewall blocks",
    },
    ConfigInvalid = 20 {
        name: "EXIT_CONFIG_INVALID",
        category: Configuration,
        description: "Configuration file failed validation",
        context: "Startup validation, schema mismatches, invalid YAML/JSON",
        retry: NoRetry,
    },
    MissingDependency = 21 {
        name: "EXIT_MISSING_DEPENDENCY",
        category: Configuration,
        description: "Required dependency not found",
        context: "Missing binaries, libraries, or runtime requirements",
        retry: Investigate,
    },
    SsotVersionMismatch = 22 {
        name: "EXIT_SSOT_VERSION_MISMATCH",
        category: Configuration,
        description: "Bundled catalog version incompatible",
        context: "Helper library detects an unsupported catalog version",
        retry: NoRetry,
    },
    ConfigFileNotFound = 23 {
        name: "EXIT_CONFIG_FILE_NOT_FOUND",
        category: Configuration,
        description: "Required configuration file not found",
        context: "Explicitly specified config path doesn't exist",
    },
    EnvironmentInvalid = 24 {
        name: "EXIT_ENVIRONMENT_INVALID",
        category: Configuration,
        description: "Invalid or unsupported environment specification",
        context: "Unknown environment name, missing environment config",
    },
    HealthCheckFailed = 30 {
        name: "EXIT_HEALTH_CHECK_FAILED",
        category: Runtime,
        description: "Health check endpoint returned non-healthy status",
        context: "Startup health validation, readiness probes",
        retry: Retry,
    },
    DatabaseUnavailable = 31 {
        name: "EXIT_DATABASE_UNAVAILABLE",
        category: Runtime,
        description: "Database connection failed or unavailable",
        context: "Startup connection checks, critical query failures",
        retry: Retry,
    },
    ExternalServiceUnavailable = 32 {
        name: "EXIT_EXTERNAL_SERVICE_UNAVAILABLE",
        category: Runtime,
        description: "Required external service unavailable",
        context: "API dependencies, message queues, cache servers",
    },
    ResourceExhausted = 33 {
        name: "EXIT_RESOURCE_EXHAUSTED",
        category: Runtime,
        description: "System resources exhausted (memory, disk, file descriptors)",
        context: "Out-of-memory, disk full, too many open files",
        retry: Investigate,
    },
    OperationTimeout = 34 {
        name: "EXIT_OPERATION_TIMEOUT",
        category: Runtime,
        description: "Operation exceeded timeout threshold",
        context: "Long-running tasks, async operations, batch processing",
        retry: Retry,
    },
    InvalidArgument = 40 {
        name: "EXIT_INVALID_ARGUMENT",
        category: Usage,
        description: "Invalid command-line argument or flag value",
        context: "Type errors, out-of-range values, malformed input",
    },
    MissingRequiredArgument = 41 {
        name: "EXIT_MISSING_REQUIRED_ARGUMENT",
        category: Usage,
        description: "Required command-line argument not provided",
        context: "Missing --config, --port, or other required flags",
    },
    PermissionDenied = 50 {
        name: "EXIT_PERMISSION_DENIED",
        category: Permissions,
        description: "Insufficient permissions for operation",
        context: "File access, port binding (<1024), privileged operations",
    },
    FileNotFound = 51 {
        name: "EXIT_FILE_NOT_FOUND",
        category: Permissions,
        description: "Required file not found",
        context: "Assets, templates, data files (not config - use 23)",
    },
    DirectoryNotFound = 52 {
        name: "EXIT_DIRECTORY_NOT_FOUND",
        category: Permissions,
        description: "Required directory not found",
        context: "State directories, log paths, data directories",
    },
    FileReadError = 53 {
        name: "EXIT_FILE_READ_ERROR",
        category: Permissions,
        description: "Error reading file",
        context: "Corrupt files, I/O errors, encoding issues",
    },
    FileWriteError = 54 {
        name: "EXIT_FILE_WRITE_ERROR",
        category: Permissions,
        description: "Error writing file",
        context: "Disk full, read-only filesystem, permission errors",
    },
    DataInvalid = 60 {
        name: "EXIT_DATA_INVALID",
        category: Data,
        description: "Input data failed validation",
        context: "Schema validation, business rule violations",
    },
    ParseError = 61 {
        name: "EXIT_PARSE_ERROR",
        category: Data,
        description: "Error parsing input data",
        context: "Malformed JSON/YAML/XML, syntax errors",
    },
    TransformationFailed = 62 {
        name: "EXIT_TRANSFORMATION_FAILED",
        category: Data,
        description: "Data transformation or conversion failed",
        context: "Type conversions, format transformations, encoding changes",
    },
    DataCorrupt = 63 {
        name: "EXIT_DATA_CORRUPT",
        category: Data,
        description: "Data corruption detected",
        context: "Checksum failures, integrity violations",
    },
    Usage = 64 {
        name: "EXIT_USAGE",
        category: Usage,
        description: "Command-line usage error",
        context: "BSD sysexits.h EX_USAGE - wrong number of arguments, bad syntax",
        bsd: "EX_USAGE",
    },
    AuthenticationFailed = 70 {
        name: "EXIT_AUTHENTICATION_FAILED",
        category: Security,
        description: "Authentication failed",
        context: "Invalid credentials, expired tokens, auth service unavailable",
    },
    AuthorizationFailed = 71 {
        name: "EXIT_AUTHORIZATION_FAILED",
        category: Security,
        description: "Authorization failed (authenticated but insufficient permissions)",
        context: "RBAC failures, scope violations, resource access denied",
    },
    SecurityViolation = 72 {
        name: "EXIT_SECURITY_VIOLATION",
        category: Security,
        description: "Security policy violation detected",
        context: "Suspicious activity, rate limit exceeded, IP blocklist",
    },
    CertificateInvalid = 73 {
        name: "EXIT_CERTIFICATE_INVALID",
        category: Security,
        description: "TLS/SSL certificate validation failed",
        context: "Expired certs, untrusted CAs, hostname mismatches",
        bsd: "EX_PROTOCOL",
    },
    MetricsUnavailable = 80 {
        name: "EXIT_METRICS_UNAVAILABLE",
        category: Observability,
        description: "Metrics endpoint or collection system unavailable",
        context: "Observability-focused tools (Prometheus exporters, StatsD agents); workhorses should log and continue",
    },
    TracingFailed = 81 {
        name: "EXIT_TRACING_FAILED",
        category: Observability,
        description: "Distributed tracing system unavailable",
        context: "OTLP exporter failed, Jaeger collector unreachable",
    },
    LoggingFailed = 82 {
        name: "EXIT_LOGGING_FAILED",
        category: Observability,
        description: "Logging system unavailable or misconfigured",
        context: "Log aggregator unreachable, log file unwritable",
    },
    AlertSystemFailed = 83 {
        name: "EXIT_ALERT_SYSTEM_FAILED",
        category: Observability,
        description: "Alerting system unavailable",
        context: "PagerDuty API failed, Slack webhook unreachable",
    },
    StructuredLoggingFailed = 84 {
        name: "EXIT_STRUCTURED_LOGGING_FAILED",
        category: Observability,
        description: "Structured logging system unavailable",
        context: "JSON log aggregator unreachable, log schema validation failed",
    },
    TestFailure = 91 {
        name: "EXIT_TEST_FAILURE",
        category: Testing,
        description: "One or more tests failed",
        context: "Test assertions failed, expected behavior not met",
    },
    TestError = 92 {
        name: "EXIT_TEST_ERROR",
        category: Testing,
        description: "Test execution error (not test failure)",
        context: "Test setup failed, fixture unavailable, test harness error",
    },
    TestInterrupted = 93 {
        name: "EXIT_TEST_INTERRUPTED",
        category: Testing,
        description: "Test run interrupted by user or system",
        context: "Ctrl+C during tests, system signal, user cancellation",
    },
    TestUsageError = 94 {
        name: "EXIT_TEST_USAGE_ERROR",
        category: Testing,
        description: "Test command usage error",
        context: "Invalid test arguments, bad configuration",
    },
    TestNoTestsCollected = 95 {
        name: "EXIT_TEST_NO_TESTS_COLLECTED",
        category: Testing,
        description: "No tests found or all tests skipped",
        context: "Empty test suite, all tests deselected or skipped",
    },
    CoverageThresholdNotMet = 96 {
        name: "EXIT_COVERAGE_THRESHOLD_NOT_MET",
        category: Testing,
        description: "Test coverage below required threshold",
        context: "Code coverage validation, quality gate failure",
    },
    SignalHup = 129 {
        name: "EXIT_SIGNAL_HUP",
        category: Signals,
        description: "Hangup signal (SIGHUP) - config reload via restart",
        context: "Process exits with 129 and the supervisor restarts it with new config",
        bsd: "128 + 1",
    },
    SignalInt = 130 {
        name: "EXIT_SIGNAL_INT",
        category: Signals,
        description: "Interrupt signal (SIGINT) - user interrupt",
        context: "Ctrl+C pressed; same code for graceful and forced exit",
        bsd: "128 + 2",
    },
    SignalQuit = 131 {
        name: "EXIT_SIGNAL_QUIT",
        category: Signals,
        description: "Quit signal (SIGQUIT) - immediate exit",
        context: "Ctrl+\\ on Unix, Ctrl+Break on Windows; no cleanup",
        bsd: "128 + 3",
    },
    SignalKill = 137 {
        name: "EXIT_SIGNAL_KILL",
        category: Signals,
        description: "Kill signal (SIGKILL)",
        context: "Forceful termination, non-graceful shutdown (not catchable)",
        bsd: "128 + 9",
    },
    SignalUsr1 = 138 {
        name: "EXIT_SIGNAL_USR1",
        category: Signals,
        description: "User-defined signal 1 (SIGUSR1) - custom handler",
        context: "Application-specific signal; 128+10 on Linux, macOS/FreeBSD use signal 30",
        bsd: "128 + 10",
    },
    SignalUsr2 = 140 {
        name: "EXIT_SIGNAL_USR2",
        category: Signals,
        description: "User-defined signal 2 (SIGUSR2) - custom handler",
        context: "Application-specific signal; 128+12 on Linux, macOS/FreeBSD use signal 31",
        bsd: "128 + 12",
    },
    SignalPipe = 141 {
        name: "EXIT_SIGNAL_PIPE",
        category: Signals,
        description: "Broken pipe (SIGPIPE) - observe only",
        context: "Writing to closed pipe/socket, reader terminated",
        bsd: "128 + 13",
    },
    SignalAlrm = 142 {
        name: "EXIT_SIGNAL_ALRM",
        category: Signals,
        description: "Alarm signal (SIGALRM) - watchdog timeout",
        context: "Watchdog timer expired; treat as timeout-induced exit",
        bsd: "128 + 14",
    },
    SignalTerm = 143 {
        name: "EXIT_SIGNAL_TERM",
        category: Signals,
        description: "Termination signal (SIGTERM) - graceful shutdown",
        context: "Graceful shutdown requested by container orchestrator or process supervisor",
        bsd: "128 + 15",
    },
}

impl ExitCode {
    /// Returns the numeric exit code value.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Symbolic name (e.g. `EXIT_PORT_IN_USE`)
    pub fn name(self) -> &'static str {
        self.info().name
    }

    pub fn description(self) -> &'static str {
        self.info().description
    }

    pub fn category(self) -> ExitCodeCategory {
        self.info().category
    }

    pub fn retry_hint(self) -> Option<RetryHint> {
        self.info().retry_hint
    }

    /// Look up by numeric value
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL
            .binary_search_by_key(&code, |c| c.code())
            .ok()
            .map(|idx| Self::ALL[idx])
    }

    /// Look up by symbolic name (exact, case-sensitive)
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.name() == name)
    }

    /// Resolve either kind of key
    pub fn lookup(key: &ExitCodeKey) -> Option<Self> {
        match key {
            ExitCodeKey::Code(code) => Self::from_code(*code),
            ExitCodeKey::Name(name) => Self::from_name(name),
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

impl TryFrom<i32> for ExitCode {
    type Error = RegistryError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or(RegistryError::UnknownExitCode {
            key: ExitCodeKey::Code(code),
        })
    }
}

impl FromStr for ExitCode {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| RegistryError::UnknownExitCode {
            key: ExitCodeKey::Name(s.to_string()),
        })
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        // Every published value is below 256
        std::process::ExitCode::from(code.code() as u8)
    }
}

/// Lookup key for an exit code: its numeric value or its symbolic name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExitCodeKey {
    Code(i32),
    Name(String),
}

impl fmt::Display for ExitCodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCodeKey::Code(code) => write!(f, "{code}"),
            ExitCodeKey::Name(name) => f.write_str(name),
        }
    }
}

impl From<i32> for ExitCodeKey {
    fn from(code: i32) -> Self {
        ExitCodeKey::Code(code)
    }
}

impl From<&str> for ExitCodeKey {
    fn from(name: &str) -> Self {
        ExitCodeKey::Name(name.to_string())
    }
}

impl From<String> for ExitCodeKey {
    fn from(name: String) -> Self {
        ExitCodeKey::Name(name)
    }
}

impl From<ExitCode> for ExitCodeKey {
    fn from(code: ExitCode) -> Self {
        ExitCodeKey::Code(code.code())
    }
}

impl FromStr for ExitCodeKey {
    type Err = std::convert::Infallible;

    /// Decimal text is a numeric key, anything else is a symbolic name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.parse::<i32>() {
            Ok(code) => ExitCodeKey::Code(code),
            Err(_) => ExitCodeKey::Name(s.to_string()),
        })
    }
}
