// Core data structures for the education dashboard

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

use crate::error::{Error, Result};

/// School level (jenjang)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Level {
    #[serde(rename = "SD")]
    Sd,
    #[serde(rename = "SMP")]
    Smp,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "SMK")]
    Smk,
    #[serde(rename = "SLB")]
    Slb,
}

impl Level {
    /// All levels in display order
    pub const ALL: [Level; 5] = [Self::Sd, Self::Smp, Self::Sma, Self::Smk, Self::Slb];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sd => "SD",
            Self::Smp => "SMP",
            Self::Sma => "SMA",
            Self::Smk => "SMK",
            Self::Slb => "SLB",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "SD" => Ok(Self::Sd),
            "SMP" => Ok(Self::Smp),
            "SMA" => Ok(Self::Sma),
            "SMK" => Ok(Self::Smk),
            "SLB" => Ok(Self::Slb),
            other => Err(Error::validation(format!("unknown level: {other}"))),
        }
    }
}

/// School ownership (status sekolah)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Ownership {
    Negeri,
    Swasta,
}

impl Ownership {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negeri => "NEGERI",
            Self::Swasta => "SWASTA",
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Self::Negeri)
    }
}

impl fmt::Display for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Ownership {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "NEGERI" => Ok(Self::Negeri),
            "SWASTA" => Ok(Self::Swasta),
            other => Err(Error::validation(format!("unknown ownership: {other}"))),
        }
    }
}

/// Accreditation grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Accreditation {
    A,
    B,
    C,
    /// Stored as "TT", displayed as "Tidak Terakreditasi"
    #[serde(rename = "TT")]
    NotAccredited,
    #[default]
    #[serde(rename = "Belum Terakreditasi")]
    Pending,
}

impl Accreditation {
    pub const ALL: [Accreditation; 5] = [
        Self::A,
        Self::B,
        Self::C,
        Self::NotAccredited,
        Self::Pending,
    ];

    /// Stored value
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::NotAccredited => "TT",
            Self::Pending => "Belum Terakreditasi",
        }
    }

    /// Human-facing label
    pub fn label(&self) -> &'static str {
        match self {
            Self::NotAccredited => "Tidak Terakreditasi",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for Accreditation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Accreditation {
    type Err = Error;

    /// Accepts both the stored value and the display label
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "A" => Ok(Self::A),
            "B" => Ok(Self::B),
            "C" => Ok(Self::C),
            "TT" | "Tidak Terakreditasi" => Ok(Self::NotAccredited),
            "Belum Terakreditasi" => Ok(Self::Pending),
            other => Err(Error::validation(format!("unknown accreditation: {other}"))),
        }
    }
}

/// Composite key identifying one allocation group
///
/// Schools sharing a key also share one aggregate student-count target.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupKey {
    pub level: Level,
    pub ownership: Ownership,
    pub regency: String,
}

impl GroupKey {
    pub fn new(level: Level, ownership: Ownership, regency: impl Into<String>) -> Self {
        Self {
            level,
            ownership,
            regency: regency.into(),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.level, self.ownership, self.regency)
    }
}

/// School record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct School {
    pub id: String,
    pub name: String,
    pub npsn: String,
    pub level: Level,
    pub ownership: Ownership,
    pub address: String,
    #[serde(default)]
    pub province_code: String,
    #[serde(default)]
    pub province_name: String,
    #[serde(default)]
    pub regency_code: String,
    #[serde(default)]
    pub regency_name: String,
    #[serde(default)]
    pub bps_district_code: String,
    #[serde(default)]
    pub bps_district_name: String,
    #[serde(default)]
    pub district_code: String,
    #[serde(default)]
    pub district_name: String,
    pub year: i32,
    pub student_count: u64,
    pub accreditation: Accreditation,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl School {
    /// Allocation group this school belongs to
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.level, self.ownership, self.regency_name.clone())
    }
}

fn default_year() -> i32 {
    2023
}

/// Payload for creating a school
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSchool {
    pub name: String,
    pub npsn: String,
    pub level: Level,
    pub ownership: Ownership,
    pub address: String,
    #[serde(default)]
    pub province_code: String,
    #[serde(default)]
    pub province_name: String,
    #[serde(default)]
    pub regency_code: String,
    #[serde(default)]
    pub regency_name: String,
    #[serde(default)]
    pub bps_district_code: String,
    #[serde(default)]
    pub bps_district_name: String,
    #[serde(default)]
    pub district_code: String,
    #[serde(default)]
    pub district_name: String,
    #[serde(default = "default_year")]
    pub year: i32,
    #[serde(default)]
    pub student_count: u64,
    #[serde(default)]
    pub accreditation: Accreditation,
}

impl NewSchool {
    /// Trim text fields and reject blank required ones
    pub fn validate(&mut self) -> Result<()> {
        for field in [
            &mut self.name,
            &mut self.npsn,
            &mut self.address,
            &mut self.province_code,
            &mut self.province_name,
            &mut self.regency_code,
            &mut self.regency_name,
            &mut self.bps_district_code,
            &mut self.bps_district_name,
            &mut self.district_code,
            &mut self.district_name,
        ] {
            *field = field.trim().to_string();
        }

        require("name", &self.name)?;
        require("npsn", &self.npsn)?;
        require("address", &self.address)?;
        check_count("student_count", self.student_count)?;
        Ok(())
    }

    /// Materialize into a stored record with a fresh id
    pub fn into_school(self) -> School {
        let now = Utc::now();
        School {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            npsn: self.npsn,
            level: self.level,
            ownership: self.ownership,
            address: self.address,
            province_code: self.province_code,
            province_name: self.province_name,
            regency_code: self.regency_code,
            regency_name: self.regency_name,
            bps_district_code: self.bps_district_code,
            bps_district_name: self.bps_district_name,
            district_code: self.district_code,
            district_name: self.district_name,
            year: self.year,
            student_count: self.student_count,
            accreditation: self.accreditation,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for a school; absent fields keep their value
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolUpdate {
    pub name: Option<String>,
    pub npsn: Option<String>,
    pub level: Option<Level>,
    pub ownership: Option<Ownership>,
    pub address: Option<String>,
    pub province_code: Option<String>,
    pub province_name: Option<String>,
    pub regency_code: Option<String>,
    pub regency_name: Option<String>,
    pub bps_district_code: Option<String>,
    pub bps_district_name: Option<String>,
    pub district_code: Option<String>,
    pub district_name: Option<String>,
    pub year: Option<i32>,
    pub student_count: Option<u64>,
    pub accreditation: Option<Accreditation>,
}

impl SchoolUpdate {
    /// Apply onto an existing record, validating required fields
    pub fn apply(self, school: &mut School) -> Result<()> {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = value {
                *target = v.trim().to_string();
            }
        }

        if let Some(count) = self.student_count {
            check_count("student_count", count)?;
        }

        set(&mut school.name, self.name);
        set(&mut school.npsn, self.npsn);
        set(&mut school.address, self.address);
        set(&mut school.province_code, self.province_code);
        set(&mut school.province_name, self.province_name);
        set(&mut school.regency_code, self.regency_code);
        set(&mut school.regency_name, self.regency_name);
        set(&mut school.bps_district_code, self.bps_district_code);
        set(&mut school.bps_district_name, self.bps_district_name);
        set(&mut school.district_code, self.district_code);
        set(&mut school.district_name, self.district_name);

        if let Some(level) = self.level {
            school.level = level;
        }
        if let Some(ownership) = self.ownership {
            school.ownership = ownership;
        }
        if let Some(year) = self.year {
            school.year = year;
        }
        if let Some(count) = self.student_count {
            school.student_count = count;
        }
        if let Some(accreditation) = self.accreditation {
            school.accreditation = accreditation;
        }

        require("name", &school.name)?;
        require("npsn", &school.npsn)?;
        require("address", &school.address)?;
        school.updated_at = Utc::now();
        Ok(())
    }
}

/// Aggregate student count for one regency / level / ownership / year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentStatistic {
    pub id: String,
    pub province_code: String,
    pub province_name: String,
    pub regency_code: String,
    pub regency_name: String,
    pub level: Level,
    pub ownership: Ownership,
    pub student_count: u64,
    pub academic_year: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StudentStatistic {
    pub fn group_key(&self) -> GroupKey {
        GroupKey::new(self.level, self.ownership, self.regency_name.clone())
    }
}

/// Payload for inserting a student statistic row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewStudentStatistic {
    #[serde(default)]
    pub province_code: String,
    #[serde(default)]
    pub province_name: String,
    #[serde(default)]
    pub regency_code: String,
    pub regency_name: String,
    pub level: Level,
    pub ownership: Ownership,
    pub student_count: u64,
    pub academic_year: String,
}

impl NewStudentStatistic {
    pub fn into_statistic(self) -> Result<StudentStatistic> {
        require("regency_name", &self.regency_name)?;
        require("academic_year", &self.academic_year)?;
        check_count("student_count", self.student_count)?;
        let now = Utc::now();
        Ok(StudentStatistic {
            id: uuid::Uuid::new_v4().to_string(),
            province_code: self.province_code.trim().to_string(),
            province_name: self.province_name.trim().to_string(),
            regency_code: self.regency_code.trim().to_string(),
            regency_name: self.regency_name.trim().to_string(),
            level: self.level,
            ownership: self.ownership,
            student_count: self.student_count,
            academic_year: self.academic_year.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Education program delivered at a school
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EducationProgram {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub recipients: u64,
    pub school_id: String,
    #[serde(default)]
    pub npsn: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal school reference embedded in program listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchoolRef {
    pub id: String,
    pub name: String,
    pub level: Level,
}

/// Program together with the school it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramWithSchool {
    #[serde(flatten)]
    pub program: EducationProgram,
    pub school: Option<SchoolRef>,
}

pub const PROGRAM_YEAR_RANGE: std::ops::RangeInclusive<i32> = 2000..=2100;

/// Payload for creating a program
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgram {
    pub id: String,
    pub name: String,
    pub year: i32,
    pub recipients: u64,
    pub school_id: String,
    #[serde(default)]
    pub npsn: String,
    #[serde(default)]
    pub description: String,
}

impl NewProgram {
    pub fn into_program(self) -> Result<EducationProgram> {
        require("id", &self.id)?;
        require("name", &self.name)?;
        require("school_id", &self.school_id)?;
        check_program_year(self.year)?;
        check_count("recipients", self.recipients)?;

        let now = Utc::now();
        Ok(EducationProgram {
            id: self.id.trim().to_string(),
            name: self.name.trim().to_string(),
            year: self.year,
            recipients: self.recipients,
            school_id: self.school_id.trim().to_string(),
            npsn: self.npsn.trim().to_string(),
            description: self.description.trim().to_string(),
            created_at: now,
            updated_at: now,
        })
    }
}

/// Partial update for a program
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgramUpdate {
    pub name: Option<String>,
    pub year: Option<i32>,
    pub recipients: Option<u64>,
    pub school_id: Option<String>,
    pub npsn: Option<String>,
    pub description: Option<String>,
}

impl ProgramUpdate {
    pub fn apply(self, program: &mut EducationProgram) -> Result<()> {
        if let Some(name) = self.name {
            program.name = name.trim().to_string();
        }
        if let Some(year) = self.year {
            program.year = year;
        }
        if let Some(recipients) = self.recipients {
            check_count("recipients", recipients)?;
            program.recipients = recipients;
        }
        if let Some(school_id) = self.school_id {
            program.school_id = school_id.trim().to_string();
        }
        if let Some(npsn) = self.npsn {
            program.npsn = npsn.trim().to_string();
        }
        if let Some(description) = self.description {
            program.description = description.trim().to_string();
        }

        require("name", &program.name)?;
        require("school_id", &program.school_id)?;
        check_program_year(program.year)?;
        program.updated_at = Utc::now();
        Ok(())
    }
}

// ============================================================================
// Admin accounts
// ============================================================================

/// Shortest accepted password
pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<std::result::Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$"));

/// Account role
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    /// Manages one school, linked by NPSN
    #[default]
    Admin,
    /// Manages every school and every account
    Superadmin,
}

impl AdminRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for AdminRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AdminRole {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::Superadmin),
            other => Err(Error::validation(format!("unknown role: {other}"))),
        }
    }
}

/// Dashboard account
///
/// The password hash never leaves the process: it is skipped when
/// serializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub role: AdminRole,
    /// NPSN of the managed school; empty for superadmins
    #[serde(default)]
    pub npsn: String,
    #[serde(default)]
    pub school_id: String,
    #[serde(default)]
    pub phone: String,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn is_superadmin(&self) -> bool {
        self.role == AdminRole::Superadmin
    }
}

/// Payload for creating an account
#[derive(Clone, Deserialize)]
pub struct NewAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: AdminRole,
    #[serde(default)]
    pub npsn: String,
    #[serde(default)]
    pub phone: String,
}

impl NewAdmin {
    /// Trim text, lowercase the email and check every rule
    pub fn validate(&mut self) -> Result<()> {
        self.name = self.name.trim().to_string();
        self.email = normalize_email(&self.email);
        self.npsn = self.npsn.trim().to_string();
        self.phone = self.phone.trim().to_string();
        if self.role == AdminRole::Superadmin {
            self.npsn.clear();
        }

        require("name", &self.name)?;
        require("email", &self.email)?;
        require("password", &self.password)?;
        check_email(&self.email)?;
        check_password(&self.password)
    }

    /// Materialize with an already-hashed password and resolved school
    pub fn into_admin(self, password_hash: String, school_id: String) -> Admin {
        let now = Utc::now();
        Admin {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            email: self.email,
            password_hash,
            role: self.role,
            npsn: self.npsn,
            school_id,
            phone: self.phone,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update for an account; the password has its own operation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<AdminRole>,
    pub npsn: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl AdminUpdate {
    /// Apply onto an existing account
    ///
    /// A superadmin carries no school link. The caller resolves `school_id`
    /// for a changed NPSN.
    pub fn apply(self, admin: &mut Admin) -> Result<()> {
        if let Some(name) = self.name {
            admin.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            admin.email = normalize_email(&email);
        }
        if let Some(role) = self.role {
            admin.role = role;
        }
        if let Some(npsn) = self.npsn {
            let npsn = npsn.trim().to_string();
            if npsn != admin.npsn {
                admin.school_id.clear();
            }
            admin.npsn = npsn;
        }
        if let Some(phone) = self.phone {
            admin.phone = phone.trim().to_string();
        }
        if let Some(is_active) = self.is_active {
            admin.is_active = is_active;
        }
        if admin.is_superadmin() {
            admin.npsn.clear();
            admin.school_id.clear();
        }

        require("name", &admin.name)?;
        require("email", &admin.email)?;
        check_email(&admin.email)?;
        admin.updated_at = Utc::now();
        Ok(())
    }
}

/// Login request
#[derive(Clone, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password replacement request
#[derive(Clone, Deserialize)]
pub struct PasswordReset {
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// Emails are compared trimmed and lowercase
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_email(email: &str) -> Result<()> {
    let pattern = EMAIL_PATTERN
        .as_ref()
        .map_err(|e| Error::with_source("email pattern failed to compile", e.clone()))?;
    if !pattern.is_match(email) {
        return Err(Error::validation(format!("invalid email address: {email}")));
    }
    Ok(())
}

/// Passwords need at least [`MIN_PASSWORD_LEN`] characters
pub fn check_password(password: &str) -> Result<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(Error::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn check_program_year(year: i32) -> Result<()> {
    if !PROGRAM_YEAR_RANGE.contains(&year) {
        return Err(Error::validation(format!(
            "year must be between {} and {}, got {year}",
            PROGRAM_YEAR_RANGE.start(),
            PROGRAM_YEAR_RANGE.end()
        )));
    }
    Ok(())
}

/// Counts are stored as SQLite INTEGER, which is signed 64-bit
fn check_count(field: &str, value: u64) -> Result<()> {
    if i64::try_from(value).is_err() {
        return Err(Error::validation(format!(
            "{field} must not exceed {}, got {value}",
            i64::MAX
        )));
    }
    Ok(())
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(())
}
