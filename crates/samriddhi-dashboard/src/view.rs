//! # Dashboard State Machine
//!
//! The dashboard is a flat set of tabs selected by one active-tab value.
//! There are no transition guards between tabs; every tab is reachable
//! from every other. What *is* gated are the overview's action cards,
//! which read the profile's completion flags.
//!
//! Everything in this module is synchronous and side-effect free. The
//! async half lives in [`crate::Dashboard`].

use serde::{Deserialize, Serialize};

use samriddhi_core::{ProfileField, UserProfile};

/// A dashboard body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DashboardTab {
    /// Status indicators and action cards.
    #[default]
    Overview,
    /// Profile rows.
    Profile,
    /// Relief verification form.
    CaptureInfo,
    /// Credential documents.
    GenerateDocuments,
    /// Documents awaiting processing.
    DocumentsPending,
}

impl DashboardTab {
    /// Every tab.
    pub const ALL: [DashboardTab; 5] = [
        Self::Overview,
        Self::Profile,
        Self::CaptureInfo,
        Self::GenerateDocuments,
        Self::DocumentsPending,
    ];

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Profile => "profile",
            Self::CaptureInfo => "captureInfo",
            Self::GenerateDocuments => "generateDocuments",
            Self::DocumentsPending => "documentsPending",
        }
    }

    /// Resolve a tab or navigation name. Navigation ids (`capture`,
    /// `generate`, `documents`) are accepted alongside tab names; anything
    /// unrecognized, `credentials` included, lands on the overview.
    pub fn resolve(name: &str) -> Self {
        match name {
            "profile" => Self::Profile,
            "captureInfo" | "capture" => Self::CaptureInfo,
            "generateDocuments" | "generate" => Self::GenerateDocuments,
            "documentsPending" | "documents" => Self::DocumentsPending,
            _ => Self::Overview,
        }
    }
}

impl std::fmt::Display for DashboardTab {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entry in the navigation bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NavItem {
    /// Navigation id.
    pub id: &'static str,
    /// Display label.
    pub label: &'static str,
    /// Tab the entry selects.
    pub tab: DashboardTab,
}

/// The navigation bar, in display order.
pub const NAV_ITEMS: [NavItem; 6] = [
    NavItem { id: "overview", label: "Overview", tab: DashboardTab::Overview },
    NavItem { id: "profile", label: "Profile", tab: DashboardTab::Profile },
    NavItem { id: "credentials", label: "Credentials", tab: DashboardTab::Overview },
    NavItem { id: "capture", label: "Capture Info", tab: DashboardTab::CaptureInfo },
    NavItem { id: "generate", label: "Generate Files", tab: DashboardTab::GenerateDocuments },
    NavItem { id: "documents", label: "Documents", tab: DashboardTab::DocumentsPending },
];

/// Visual tone of an indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    /// Done.
    Success,
    /// Waiting on the user or a backend.
    Warning,
    /// Neutral information.
    Primary,
}

/// A summary tile on the overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusIndicator {
    /// Tile title.
    pub title: &'static str,
    /// Current value.
    pub value: &'static str,
    /// Tile subtitle.
    pub description: &'static str,
    /// Tone.
    pub tone: Tone,
}

/// Overview card groupings, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionSection {
    /// I. Identity & Verification.
    IdentityVerification,
    /// II. Workflow & Processing.
    WorkflowProcessing,
    /// III. Financial Transactions (DBT).
    FinancialTransactions,
    /// IV. Monitoring & Reporting.
    MonitoringReporting,
    /// V. Security & Accessibility.
    SecurityAccessibility,
}

impl ActionSection {
    /// Section heading.
    pub fn heading(&self) -> &'static str {
        match self {
            Self::IdentityVerification => "Identity & Verification",
            Self::WorkflowProcessing => "Workflow & Processing",
            Self::FinancialTransactions => "Financial Transactions (DBT)",
            Self::MonitoringReporting => "Monitoring & Reporting",
            Self::SecurityAccessibility => "Security & Accessibility",
        }
    }
}

/// What invoking an action does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionEffect {
    /// Run the e-KYC action.
    VerifyIdentity,
    /// Run the credential-issuance workflow.
    IssueCredential,
    /// Switch to a tab.
    SwitchTab(DashboardTab),
    /// Nothing beyond acknowledging the click.
    Informational,
}

/// An overview action card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Initiate e-KYC.
    InitiateEkyc,
    /// Verify records (issue the credential).
    VerifyRecords,
    /// View workflow.
    ViewWorkflow,
    /// Manage documents.
    ManageDocuments,
    /// Configure PFMS.
    ConfigurePfms,
    /// Generate sanction order.
    GenerateSanction,
    /// View analytics.
    ViewAnalytics,
    /// View audit logs.
    ViewAuditLogs,
    /// Security settings.
    SecuritySettings,
    /// API management.
    ApiManagement,
}

impl ActionKind {
    /// Every action, in display order.
    pub const ALL: [ActionKind; 10] = [
        Self::InitiateEkyc,
        Self::VerifyRecords,
        Self::ViewWorkflow,
        Self::ManageDocuments,
        Self::ConfigurePfms,
        Self::GenerateSanction,
        Self::ViewAnalytics,
        Self::ViewAuditLogs,
        Self::SecuritySettings,
        Self::ApiManagement,
    ];

    /// URL slug.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::InitiateEkyc => "initiate-ekyc",
            Self::VerifyRecords => "verify-records",
            Self::ViewWorkflow => "view-workflow",
            Self::ManageDocuments => "manage-documents",
            Self::ConfigurePfms => "configure-pfms",
            Self::GenerateSanction => "generate-sanction",
            Self::ViewAnalytics => "view-analytics",
            Self::ViewAuditLogs => "view-audit-logs",
            Self::SecuritySettings => "security-settings",
            Self::ApiManagement => "api-management",
        }
    }

    /// Look an action up by slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.slug() == slug)
    }

    /// Button label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::InitiateEkyc => "Initiate e-KYC",
            Self::VerifyRecords => "Verify Records",
            Self::ViewWorkflow => "View Workflow",
            Self::ManageDocuments => "Manage Documents",
            Self::ConfigurePfms => "Configure PFMS",
            Self::GenerateSanction => "Generate Sanction",
            Self::ViewAnalytics => "View Analytics",
            Self::ViewAuditLogs => "View Audit Logs",
            Self::SecuritySettings => "Security Settings",
            Self::ApiManagement => "API Management",
        }
    }

    /// Card title.
    pub fn title(&self) -> &'static str {
        match self {
            Self::InitiateEkyc => "e-KYC & ID Validation",
            Self::VerifyRecords => "CCTNS/eCourts Integration",
            Self::ViewWorkflow => "BPM Workflow Engine",
            Self::ManageDocuments => "Digital Document Management",
            Self::ConfigurePfms => "PFMS Integration Gateway",
            Self::GenerateSanction => "Digital Sanction Orders",
            Self::ViewAnalytics => "Real-Time BI Dashboard",
            Self::ViewAuditLogs => "Audit Trail Ledger",
            Self::SecuritySettings => "Data Encryption & Masking",
            Self::ApiManagement => "API Gateway & OAuth",
        }
    }

    /// Overview section the card sits in.
    pub fn section(&self) -> ActionSection {
        match self {
            Self::InitiateEkyc | Self::VerifyRecords => ActionSection::IdentityVerification,
            Self::ViewWorkflow | Self::ManageDocuments => ActionSection::WorkflowProcessing,
            Self::ConfigurePfms | Self::GenerateSanction => ActionSection::FinancialTransactions,
            Self::ViewAnalytics | Self::ViewAuditLogs => ActionSection::MonitoringReporting,
            Self::SecuritySettings | Self::ApiManagement => ActionSection::SecurityAccessibility,
        }
    }

    /// What invoking the action does.
    pub fn effect(&self) -> ActionEffect {
        match self {
            Self::InitiateEkyc => ActionEffect::VerifyIdentity,
            Self::VerifyRecords => ActionEffect::IssueCredential,
            Self::ViewWorkflow => ActionEffect::SwitchTab(DashboardTab::CaptureInfo),
            Self::ManageDocuments => ActionEffect::SwitchTab(DashboardTab::GenerateDocuments),
            _ => ActionEffect::Informational,
        }
    }

    /// Whether the card is disabled for this profile.
    pub fn disabled(&self, profile: Option<&UserProfile>) -> bool {
        let verified = profile.is_some_and(UserProfile::identity_verified);
        let issued = profile.is_some_and(UserProfile::credential_issued);
        match self {
            Self::VerifyRecords => !verified,
            Self::ManageDocuments | Self::ConfigurePfms | Self::GenerateSanction => !issued,
            _ => false,
        }
    }

    /// Whether the card's step is already done for this profile.
    pub fn completed(&self, profile: Option<&UserProfile>) -> bool {
        let Some(p) = profile else {
            return false;
        };
        match self {
            Self::InitiateEkyc => p.identity_verified(),
            Self::VerifyRecords => p.credential_issued(),
            Self::ViewWorkflow => p.info_captured(),
            _ => false,
        }
    }
}

/// A rendered action card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionCard {
    /// The action.
    pub action: ActionKind,
    /// Card title.
    pub title: &'static str,
    /// Button label.
    pub label: &'static str,
    /// Section.
    pub section: ActionSection,
    /// Disabled by a prerequisite.
    pub disabled: bool,
    /// Step already done.
    pub completed: bool,
}

impl ActionCard {
    /// Whether the card can be clicked.
    pub fn invocable(&self) -> bool {
        !self.disabled && !self.completed
    }
}

/// One line of the profile tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileRow {
    /// Row label.
    pub label: &'static str,
    /// Value, or "Not provided".
    pub value: String,
}

/// Per-view dashboard state: the active tab and the cached profile.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DashboardState {
    active_tab: DashboardTab,
    profile: Option<UserProfile>,
    suggested_tab: Option<DashboardTab>,
}

impl DashboardState {
    /// Fresh state on the overview with no profile loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// The tab on screen.
    pub fn active_tab(&self) -> DashboardTab {
        self.active_tab
    }

    /// Switch tabs. Always allowed.
    pub fn select_tab(&mut self, tab: DashboardTab) {
        self.active_tab = tab;
        self.suggested_tab = None;
    }

    /// Switch tabs by name; see [`DashboardTab::resolve`].
    pub fn select_named(&mut self, name: &str) -> DashboardTab {
        let tab = DashboardTab::resolve(name);
        self.select_tab(tab);
        tab
    }

    /// The cached profile, if one has been loaded.
    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Replace the cached profile.
    pub fn set_profile(&mut self, profile: Option<UserProfile>) {
        self.profile = profile;
    }

    /// A tab the user is invited to move to, set after a successful
    /// issuance. Following it is the caller's choice.
    pub fn suggested_tab(&self) -> Option<DashboardTab> {
        self.suggested_tab
    }

    /// Offer navigation to `tab`.
    pub fn suggest(&mut self, tab: DashboardTab) {
        self.suggested_tab = Some(tab);
    }

    /// Accept the pending suggestion, if any.
    pub fn follow_suggestion(&mut self) -> Option<DashboardTab> {
        let tab = self.suggested_tab.take()?;
        self.active_tab = tab;
        Some(tab)
    }

    /// The four overview tiles.
    pub fn status_indicators(&self) -> [StatusIndicator; 4] {
        let verified = self.profile().is_some_and(UserProfile::identity_verified);
        let issued = self.profile().is_some_and(UserProfile::credential_issued);
        [
            StatusIndicator {
                title: "e-KYC Status",
                value: if verified { "Verified" } else { "Pending" },
                description: "Aadhaar authentication",
                tone: if verified { Tone::Success } else { Tone::Warning },
            },
            StatusIndicator {
                title: "Workflow Stage",
                value: if issued { "Approved" } else { "Processing" },
                description: "BPM engine status",
                tone: if issued { Tone::Success } else { Tone::Warning },
            },
            StatusIndicator {
                title: "DBT Status",
                value: "PFMS Ready",
                description: "Fund transfer gateway",
                tone: Tone::Primary,
            },
            StatusIndicator {
                title: "Encryption",
                value: "AES-256",
                description: "End-to-end encryption",
                tone: Tone::Success,
            },
        ]
    }

    /// The card for one action.
    pub fn action_card(&self, action: ActionKind) -> ActionCard {
        ActionCard {
            action,
            title: action.title(),
            label: action.label(),
            section: action.section(),
            disabled: action.disabled(self.profile()),
            completed: action.completed(self.profile()),
        }
    }

    /// Every action card, in display order.
    pub fn action_cards(&self) -> Vec<ActionCard> {
        ActionKind::ALL
            .into_iter()
            .map(|a| self.action_card(a))
            .collect()
    }

    /// The profile tab.
    pub fn profile_rows(&self) -> Vec<ProfileRow> {
        let empty = UserProfile::new();
        let p = self.profile().unwrap_or(&empty);
        vec![
            ProfileRow {
                label: "Full Name",
                value: p.display(ProfileField::FullName).to_string(),
            },
            ProfileRow {
                label: "Phone / Emergency Contact",
                value: p.display_contact().to_string(),
            },
            ProfileRow {
                label: "Address",
                value: p.display(ProfileField::Address).to_string(),
            },
            ProfileRow {
                label: "Date of Birth",
                value: p.display(ProfileField::DateOfBirth).to_string(),
            },
            ProfileRow {
                label: "Nationality",
                value: p.display(ProfileField::Nationality).to_string(),
            },
        ]
    }
}
