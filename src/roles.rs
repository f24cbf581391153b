//! Priority-ordered role classifier with confidence scoring
//!
//! `assign_role` is a pure function over (path, profile): an ordered decision
//! table evaluated top-down with short-circuit on first match. Tier order is
//! load-bearing — several predicates can match the same path (a test fixture
//! directory also looks like a generic data file), so the more specific tier
//! must win. The tables are static immutable data built once at startup.

use glob::Pattern;
use once_cell::sync::Lazy;

use crate::profiles::Profile;
use crate::schema::Role;

/// Result of classifying a single path
///
/// Deterministic: identical (path, profile) inputs always yield an identical
/// assignment. `reason` is never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub role: Role,
    /// In [0.0, 1.0]
    pub confidence: f64,
    pub reason: String,
}

impl RoleAssignment {
    fn new(role: Role, confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            role,
            confidence,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Static rule tables
// ============================================================================

const LOCKFILES: &[&str] = &[
    "package-lock.json",
    "yarn.lock",
    "pnpm-lock.yaml",
    "poetry.lock",
    "Pipfile.lock",
    "Cargo.lock",
    "composer.lock",
    "Gemfile.lock",
    "go.sum",
    "flake.lock",
    "bun.lockb",
    "uv.lock",
];

static CI_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        ".github/workflows/**",
        ".github/actions/**",
        ".circleci/**",
        ".gitlab-ci.yml",
        ".travis.yml",
        "Jenkinsfile",
        "azure-pipelines.yml",
        ".buildkite/**",
    ])
});

static GENERATED_DIR_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "dist/**",
        "build/**",
        "out/**",
        "target/**",
        "_build/**",
        ".next/**",
        ".nuxt/**",
        ".output/**",
    ])
});

static VENDOR_DIR_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "vendor/**",
        "third_party/**",
        "third-party/**",
        "extern/**",
        "external/**",
    ])
});

static FIXTURE_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "tests/fixtures/**",
        "test/fixtures/**",
        "tests/data/**",
        "test/data/**",
        "tests/testdata/**",
        "test/testdata/**",
        "**/fixtures/**",
        "**/__fixtures__/**",
    ])
});

static TEST_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "tests/**",
        "test/**",
        "**/test_*.py",
        "**/*_test.py",
        "**/*.test.ts",
        "**/*.test.js",
        "**/*.test.tsx",
        "**/*.test.jsx",
        "**/*.spec.ts",
        "**/*.spec.js",
        "**/*.spec.tsx",
        "**/*.spec.jsx",
        "**/conftest.py",
        "**/*_test.go",
        "**/*_test.rs",
    ])
});

static SCRIPT_PATTERNS: Lazy<Vec<Pattern>> =
    Lazy::new(|| compile(&["scripts/**", "script/**", "bin/**", "tools/**", "hack/**"]));

static DOC_API_PATTERNS: Lazy<Vec<Pattern>> =
    Lazy::new(|| compile(&["docs/api/**", "doc/api/**", "api-docs/**", "reference/**"]));

const DOC_ARCH_NAMES: &[&str] = &["ARCHITECTURE.md", "DESIGN.md", "ADR.md"];

static DOC_ARCH_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "docs/adr/**",
        "doc/adr/**",
        "docs/architecture/**",
        "docs/design/**",
        "adr/**",
    ])
});

static SCHEMA_PATTERNS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "**/*.schema.json",
        "**/*.schema.yaml",
        "**/*.schema.yml",
        "**/schema/**",
        "**/*.proto",
        "**/*.graphql",
        "**/*.gql",
        "**/openapi.json",
        "**/openapi.yaml",
        "**/openapi.yml",
        "**/swagger.json",
        "**/swagger.yaml",
    ])
});

static INTERNAL_INDICATORS: Lazy<Vec<Pattern>> = Lazy::new(|| {
    compile(&[
        "_internal/**",
        "**/_*.py",
        "**/internal/**",
        "**/private/**",
    ])
});

/// Known filename -> (role, confidence, reason)
const NAME_ROLES: &[(&str, Role, f64, &str)] = &[
    ("README.md", Role::Doc, 0.95, "README is primary documentation"),
    ("README.rst", Role::Doc, 0.95, "README is primary documentation"),
    ("README.txt", Role::Doc, 0.95, "README is primary documentation"),
    ("LICENSE", Role::Doc, 0.90, "license file"),
    ("LICENSE.md", Role::Doc, 0.90, "license file"),
    ("LICENSE.txt", Role::Doc, 0.90, "license file"),
    ("CHANGELOG.md", Role::Doc, 0.90, "changelog"),
    ("CHANGES.md", Role::Doc, 0.90, "changelog"),
    ("CONTRIBUTING.md", Role::Doc, 0.90, "contribution guide"),
    ("CODE_OF_CONDUCT.md", Role::Doc, 0.85, "code of conduct"),
    ("SECURITY.md", Role::Doc, 0.85, "security policy"),
    ("pyproject.toml", Role::Config, 0.95, "Python project configuration"),
    ("setup.py", Role::Config, 0.90, "Python setup script"),
    ("setup.cfg", Role::Config, 0.90, "Python setup config"),
    ("package.json", Role::Config, 0.95, "Node.js project configuration"),
    ("tsconfig.json", Role::Config, 0.90, "TypeScript configuration"),
    ("Cargo.toml", Role::Config, 0.95, "Rust project configuration"),
    ("go.mod", Role::Config, 0.95, "Go module definition"),
    (".gitignore", Role::Config, 0.80, "git ignore rules"),
    (".editorconfig", Role::Config, 0.80, "editor configuration"),
    (".prettierrc", Role::Config, 0.80, "Prettier configuration"),
    (".eslintrc.json", Role::Config, 0.80, "ESLint configuration"),
    (".eslintrc.js", Role::Config, 0.80, "ESLint configuration"),
    ("eslint.config.js", Role::Config, 0.80, "ESLint configuration"),
    ("eslint.config.mjs", Role::Config, 0.80, "ESLint configuration"),
    ("ruff.toml", Role::Config, 0.80, "Ruff linter configuration"),
    (".flake8", Role::Config, 0.80, "Flake8 configuration"),
    ("mypy.ini", Role::Config, 0.80, "mypy configuration"),
    ("pnpm-workspace.yaml", Role::Config, 0.90, "pnpm workspace configuration"),
    ("lerna.json", Role::Config, 0.90, "Lerna monorepo configuration"),
    ("nx.json", Role::Config, 0.90, "Nx workspace configuration"),
    ("turbo.json", Role::Config, 0.90, "Turborepo configuration"),
    ("Makefile", Role::Build, 0.90, "Makefile build script"),
    ("Dockerfile", Role::Build, 0.85, "Docker build definition"),
    ("docker-compose.yml", Role::Build, 0.85, "Docker Compose definition"),
    ("docker-compose.yaml", Role::Build, 0.85, "Docker Compose definition"),
    ("Justfile", Role::Build, 0.85, "Just command runner"),
    ("Taskfile.yml", Role::Build, 0.85, "Task runner definition"),
    ("Procfile", Role::Build, 0.80, "process definition"),
    ("tox.ini", Role::Build, 0.80, "tox test runner configuration"),
    ("noxfile.py", Role::Build, 0.80, "nox test runner configuration"),
];

/// Extension -> (role, confidence, reason), low-confidence fallback tier
const EXT_ROLES: &[(&str, Role, f64, &str)] = &[
    (".md", Role::Doc, 0.60, "markdown file"),
    (".rst", Role::Doc, 0.60, "reStructuredText file"),
    (".txt", Role::Doc, 0.50, "text file (could be doc or data)"),
    (".toml", Role::Config, 0.55, "TOML file (likely config)"),
    (".cfg", Role::Config, 0.55, "config file"),
    (".ini", Role::Config, 0.55, "INI config file"),
    (".env", Role::Config, 0.70, "environment variables"),
    (".env.example", Role::Config, 0.70, "environment template"),
];

const ASSET_EXTS: &[&str] = &[
    ".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp", ".avif", ".woff", ".woff2", ".ttf",
    ".eot", ".otf", ".css", ".scss", ".sass", ".less", ".html", ".htm", ".hbs", ".ejs", ".pug",
    ".mp3", ".mp4", ".wav", ".ogg", ".webm",
];

const DATA_EXTS: &[&str] = &[
    ".csv", ".tsv", ".parquet", ".sqlite", ".db", ".sql", ".xml", ".ndjson", ".jsonl",
];

const SOURCE_EXTS: &[&str] = &[
    ".py", ".ts", ".js", ".tsx", ".jsx", ".rs", ".go", ".java", ".cs", ".cpp", ".c", ".h", ".hpp",
    ".rb", ".php", ".swift", ".kt", ".scala", ".clj", ".ex", ".exs", ".zig", ".nim", ".lua", ".sh",
    ".bash", ".zsh", ".ps1", ".psm1",
];

const PUBLIC_API_NAMES: &[&str] = &[
    "__init__.py",
    "mod.rs",
    "index.ts",
    "index.js",
    "index.tsx",
    "index.jsx",
];

fn compile(patterns: &[&str]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|p| Pattern::new(p).ok())
        .collect()
}

fn matches_any(path: &str, patterns: &[Pattern]) -> bool {
    patterns.iter().any(|p| p.matches(path))
}

/// Final path component
fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Lowercased final extension of the filename, pathlib-style: a leading dot
/// with no later dot (`.env`) yields no extension
fn file_ext(name: &str) -> String {
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[idx..].to_lowercase(),
        _ => String::new(),
    }
}

// ============================================================================
// Classification
// ============================================================================

/// Assign a role to a file path based on the profile and heuristics
///
/// Evaluates the priority tiers top-down and stops at the first match; the
/// fallback tier classifies everything else as `unknown` with a populated
/// reason.
pub fn assign_role(path: &str, profile: &Profile) -> RoleAssignment {
    let name = file_name(path);
    let ext = file_ext(name);
    let components = path.split('/').count();

    // Priority 1: profile entrypoints (highest confidence)
    for pattern in &profile.entrypoint_patterns {
        if Pattern::new(pattern).is_ok_and(|p| p.matches(path)) {
            return RoleAssignment::new(
                Role::Entrypoint,
                0.95,
                format!("matches profile entrypoint pattern '{pattern}'"),
            );
        }
    }

    // Priority 2: lockfiles (unambiguous)
    if LOCKFILES.contains(&name) {
        return RoleAssignment::new(
            Role::Lockfile,
            0.95,
            format!("'{name}' is a known lock file"),
        );
    }

    // Priority 3: CI pipelines
    if matches_any(path, &CI_PATTERNS) {
        return RoleAssignment::new(Role::Ci, 0.90, "CI/CD pipeline definition");
    }

    // Priority 4: filename-based roles
    if let Some((_, role, conf, reason)) = NAME_ROLES.iter().find(|(n, _, _, _)| *n == name) {
        return RoleAssignment::new(*role, *conf, *reason);
    }

    // Priority 5: generated / vendor directories
    if matches_any(path, &GENERATED_DIR_PATTERNS) {
        return RoleAssignment::new(
            Role::Generated,
            0.85,
            "file in generated/build output directory",
        );
    }
    if matches_any(path, &VENDOR_DIR_PATTERNS) {
        return RoleAssignment::new(
            Role::Vendor,
            0.85,
            "file in vendored third-party directory",
        );
    }

    // Priority 6: test fixtures (before tests, more specific)
    if matches_any(path, &FIXTURE_PATTERNS) {
        return RoleAssignment::new(Role::Fixture, 0.85, "test fixture or sample data");
    }

    // Priority 7: tests
    if matches_any(path, &TEST_PATTERNS) {
        return RoleAssignment::new(Role::Test, 0.85, "test file");
    }

    // Priority 8: schema files
    if matches_any(path, &SCHEMA_PATTERNS) {
        return RoleAssignment::new(Role::Schema, 0.85, "schema definition");
    }

    // Priority 9: architecture / design docs
    if DOC_ARCH_NAMES.contains(&name) {
        return RoleAssignment::new(
            Role::DocArchitecture,
            0.90,
            format!("'{name}' is an architecture document"),
        );
    }
    if matches_any(path, &DOC_ARCH_PATTERNS) {
        return RoleAssignment::new(
            Role::DocArchitecture,
            0.80,
            "file in architecture docs directory",
        );
    }

    // Priority 10: API docs
    if matches_any(path, &DOC_API_PATTERNS) {
        return RoleAssignment::new(Role::DocApi, 0.80, "file in API documentation directory");
    }

    // Priority 11: scripts
    if matches_any(path, &SCRIPT_PATTERNS) {
        return RoleAssignment::new(Role::Script, 0.75, "file in scripts/tools directory");
    }

    // Priority 12: public API modules, only below the repo root
    if PUBLIC_API_NAMES.contains(&name) && SOURCE_EXTS.contains(&ext.as_str()) && components >= 2 {
        return RoleAssignment::new(
            Role::PublicApi,
            0.70,
            format!("'{name}' is typically a public API surface"),
        );
    }

    // Priority 13: internal modules
    if matches_any(path, &INTERNAL_INDICATORS) {
        return RoleAssignment::new(Role::Internal, 0.70, "internal/private module");
    }

    // Priority 14: extension-based roles (lower confidence)
    if let Some((_, role, conf, reason)) = EXT_ROLES.iter().find(|(e, _, _, _)| *e == ext) {
        return RoleAssignment::new(*role, *conf, *reason);
    }

    // Priority 15: asset files
    if ASSET_EXTS.contains(&ext.as_str()) {
        return RoleAssignment::new(
            Role::Asset,
            0.80,
            format!("'{ext}' is a static asset extension"),
        );
    }

    // Priority 16: data files
    if DATA_EXTS.contains(&ext.as_str()) {
        return RoleAssignment::new(
            Role::Data,
            0.75,
            format!("'{ext}' is a data file extension"),
        );
    }

    // Priority 17: source code by extension
    if SOURCE_EXTS.contains(&ext.as_str()) {
        return RoleAssignment::new(Role::Source, 0.60, format!("source code ('{ext}' extension)"));
    }

    // Priority 18: JSON/YAML without a stronger signal
    if ext == ".json" || ext == ".yaml" || ext == ".yml" {
        return RoleAssignment::new(
            Role::Data,
            0.50,
            format!("'{ext}' file without stronger classification signal"),
        );
    }

    RoleAssignment::new(
        Role::Unknown,
        0.30,
        format!("no heuristic matched for '{name}'"),
    )
}
