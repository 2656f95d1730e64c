//! Repository traits and their SQLite implementation
//!
//! Handlers and seeding code depend on the traits, so they never touch SQL
//! directly:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │              API handlers / seeding commands                 │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │  SchoolRepository, StudentStatisticRepository,               │
//! │  ProgramRepository, AdminRepository                          │
//! └──────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//!                    ┌─────────────────────┐
//!                    │     SqliteStore     │
//!                    └─────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use edumon::storage::{SchoolRepository, SqliteStore};
//!
//! let store = SqliteStore::open("data/edumon.db")?;
//! let school = store.find_school_by_npsn("20219001")?;
//! ```

use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

use super::{Page, Pagination, ResetSummary, SchoolFilter, StatisticFilter};
use crate::error::{Error, Result};
use crate::models::{
    Accreditation, Admin, EducationProgram, ProgramWithSchool, School, SchoolRef,
    StudentStatistic,
};

// ============================================================================
// Repository Traits
// ============================================================================

/// Repository for school records
pub trait SchoolRepository: Send + Sync {
    /// Insert a new school; a duplicate NPSN is rejected
    fn insert_school(&self, school: &School) -> Result<()>;

    /// Get school by id
    fn get_school(&self, id: &str) -> Result<Option<School>>;

    /// Get school by NPSN
    fn find_school_by_npsn(&self, npsn: &str) -> Result<Option<School>>;

    /// Replace every field of an existing school
    fn update_school(&self, school: &School) -> Result<()>;

    /// Delete a school, returning whether it existed
    fn delete_school(&self, id: &str) -> Result<bool>;

    /// One page of schools matching the filter, sorted by name
    fn list_schools(&self, filter: &SchoolFilter, page: Pagination) -> Result<Page<School>>;

    /// Every school matching the filter, sorted by name
    fn find_schools(&self, filter: &SchoolFilter) -> Result<Vec<School>>;

    /// Total number of schools
    fn count_schools(&self) -> Result<u64>;

    /// Write new student counts in one transaction
    fn update_student_counts(&self, updates: &[(String, u64)]) -> Result<usize>;

    /// Write new accreditation grades in one transaction
    fn update_accreditations(&self, updates: &[(String, Accreditation)]) -> Result<usize>;
}

/// Repository for aggregate student statistics
pub trait StudentStatisticRepository: Send + Sync {
    /// Insert one statistic row
    fn insert_statistic(&self, statistic: &StudentStatistic) -> Result<()> {
        self.insert_statistics(std::slice::from_ref(statistic))
            .map(|_| ())
    }

    /// Insert rows in one transaction
    fn insert_statistics(&self, statistics: &[StudentStatistic]) -> Result<usize>;

    /// One page of rows, newest academic year first, then by regency
    fn list_statistics(
        &self,
        filter: &StatisticFilter,
        page: Pagination,
    ) -> Result<Page<StudentStatistic>>;

    /// Every row matching the filter, in listing order
    fn find_statistics(&self, filter: &StatisticFilter) -> Result<Vec<StudentStatistic>>;

    /// Distinct academic years, ascending
    fn academic_years(&self) -> Result<Vec<String>>;
}

/// Repository for education programs
pub trait ProgramRepository: Send + Sync {
    /// Insert a program; its school must exist
    fn insert_program(&self, program: &EducationProgram) -> Result<()>;

    /// Get program with its school embedded
    fn get_program(&self, id: &str) -> Result<Option<ProgramWithSchool>>;

    /// Replace every field of an existing program; its school must exist
    fn update_program(&self, program: &EducationProgram) -> Result<()>;

    /// Delete a program, returning whether it existed
    fn delete_program(&self, id: &str) -> Result<bool>;

    /// All programs with their schools embedded
    fn list_programs(&self) -> Result<Vec<ProgramWithSchool>>;

    /// Programs delivered at one school
    fn programs_for_school(&self, school_id: &str) -> Result<Vec<EducationProgram>>;
}

/// Repository for dashboard accounts
///
/// Emails are stored lowercase and are unique.
pub trait AdminRepository: Send + Sync {
    /// Insert a new account; a duplicate email is rejected
    fn insert_admin(&self, admin: &Admin) -> Result<()>;

    fn get_admin(&self, id: &str) -> Result<Option<Admin>>;

    /// Look up an account by its normalized email
    fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>>;

    /// Replace the profile fields of an account; the password hash is kept
    fn update_admin(&self, admin: &Admin) -> Result<()>;

    /// Delete an account, returning whether it existed
    fn delete_admin(&self, id: &str) -> Result<bool>;

    /// Every account, newest first
    fn list_admins(&self) -> Result<Vec<Admin>>;

    /// Stamp a successful login
    fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<()>;

    /// Replace the password hash
    fn set_password_hash(&self, id: &str, hash: &str) -> Result<()>;
}

// ============================================================================
// SQLite Implementation
// ============================================================================

const SCHOOL_COLUMNS: &str = "id, name, npsn, level, ownership, address, province_code, \
     province_name, regency_code, regency_name, bps_district_code, bps_district_name, \
     district_code, district_name, year, student_count, accreditation, created_at, updated_at";

const STATISTIC_COLUMNS: &str = "id, province_code, province_name, regency_code, regency_name, \
     level, ownership, student_count, academic_year, created_at, updated_at";

const ADMIN_COLUMNS: &str = "id, name, email, password_hash, role, npsn, school_id, phone, \
     is_active, last_login, created_at, updated_at";

const PROGRAM_COLUMNS: &str =
    "p.id, p.name, p.year, p.recipients, p.school_id, p.npsn, p.description, \
     p.created_at, p.updated_at, s.id, s.name, s.level";

/// SQLite-backed store implementing every repository
///
/// Uses `Mutex` to ensure thread-safety for the SQLite connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) a database file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.create_schema()?;

        tracing::info!(path = %path.display(), "SQLite store initialized");
        Ok(store)
    }

    /// Create in-memory store (for testing)
    pub fn in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.create_schema()?;
        Ok(store)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::other("SQLite connection mutex poisoned"))
    }

    fn create_schema(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(
            r#"
                CREATE TABLE IF NOT EXISTS schools (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    npsn TEXT NOT NULL UNIQUE,
                    level TEXT NOT NULL,
                    ownership TEXT NOT NULL,
                    address TEXT NOT NULL,
                    province_code TEXT NOT NULL DEFAULT '',
                    province_name TEXT NOT NULL DEFAULT '',
                    regency_code TEXT NOT NULL DEFAULT '',
                    regency_name TEXT NOT NULL DEFAULT '',
                    bps_district_code TEXT NOT NULL DEFAULT '',
                    bps_district_name TEXT NOT NULL DEFAULT '',
                    district_code TEXT NOT NULL DEFAULT '',
                    district_name TEXT NOT NULL DEFAULT '',
                    year INTEGER NOT NULL DEFAULT 2023,
                    student_count INTEGER NOT NULL DEFAULT 0 CHECK (student_count >= 0),
                    accreditation TEXT NOT NULL DEFAULT 'Belum Terakreditasi',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_schools_group
                    ON schools(level, ownership, regency_name);

                CREATE INDEX IF NOT EXISTS idx_schools_district
                    ON schools(district_name);

                CREATE INDEX IF NOT EXISTS idx_schools_accreditation
                    ON schools(accreditation);

                CREATE TABLE IF NOT EXISTS student_statistics (
                    id TEXT PRIMARY KEY,
                    province_code TEXT NOT NULL DEFAULT '',
                    province_name TEXT NOT NULL DEFAULT '',
                    regency_code TEXT NOT NULL DEFAULT '',
                    regency_name TEXT NOT NULL,
                    level TEXT NOT NULL,
                    ownership TEXT NOT NULL,
                    student_count INTEGER NOT NULL CHECK (student_count >= 0),
                    academic_year TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_statistics_group
                    ON student_statistics(level, ownership, regency_name, academic_year);

                CREATE TABLE IF NOT EXISTS education_programs (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    year INTEGER NOT NULL,
                    recipients INTEGER NOT NULL CHECK (recipients >= 0),
                    school_id TEXT NOT NULL,
                    npsn TEXT NOT NULL DEFAULT '',
                    description TEXT NOT NULL DEFAULT '',
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_programs_school
                    ON education_programs(school_id);

                CREATE TABLE IF NOT EXISTS admins (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    role TEXT NOT NULL DEFAULT 'admin',
                    npsn TEXT NOT NULL DEFAULT '',
                    school_id TEXT NOT NULL DEFAULT '',
                    phone TEXT NOT NULL DEFAULT '',
                    is_active INTEGER NOT NULL DEFAULT 1,
                    last_login TEXT,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );
                "#,
        )?;

        Ok(())
    }

    /// Delete every school, statistic and program in one transaction
    pub fn reset(&self) -> Result<ResetSummary> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let summary = ResetSummary {
            programs: tx.execute("DELETE FROM education_programs", [])?,
            statistics: tx.execute("DELETE FROM student_statistics", [])?,
            schools: tx.execute("DELETE FROM schools", [])?,
        };
        tx.commit()?;

        tracing::info!(
            schools = summary.schools,
            statistics = summary.statistics,
            programs = summary.programs,
            "Store reset"
        );
        Ok(summary)
    }

    fn school_exists(conn: &Connection, id: &str) -> Result<bool> {
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM schools WHERE id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    fn query_schools(
        &self,
        filter: &SchoolFilter,
        page: Option<Pagination>,
    ) -> Result<(Vec<School>, u64)> {
        let (where_sql, mut values) = school_where(filter);
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM schools{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!("SELECT {SCHOOL_COLUMNS} FROM schools{where_sql} ORDER BY name, id");
        if let Some(page) = page {
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Value::Integer(i64::from(page.limit)));
            values.push(Value::Integer(to_i64(page.offset())));
        }

        let mut stmt = conn.prepare(&sql)?;
        let schools = stmt
            .query_map(params_from_iter(values.iter()), school_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((schools, to_u64(total)))
    }

    fn query_statistics(
        &self,
        filter: &StatisticFilter,
        page: Option<Pagination>,
    ) -> Result<(Vec<StudentStatistic>, u64)> {
        let (where_sql, mut values) = statistic_where(filter);
        let conn = self.conn()?;

        let total: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM student_statistics{where_sql}"),
            params_from_iter(values.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "SELECT {STATISTIC_COLUMNS} FROM student_statistics{where_sql} \
             ORDER BY academic_year DESC, regency_name ASC, id"
        );
        if let Some(page) = page {
            sql.push_str(" LIMIT ? OFFSET ?");
            values.push(Value::Integer(i64::from(page.limit)));
            values.push(Value::Integer(to_i64(page.offset())));
        }

        let mut stmt = conn.prepare(&sql)?;
        let statistics = stmt
            .query_map(params_from_iter(values.iter()), statistic_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((statistics, to_u64(total)))
    }
}

impl SchoolRepository for SqliteStore {
    fn insert_school(&self, school: &School) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO schools ({SCHOOL_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)"
            ),
            params![
                school.id,
                school.name,
                school.npsn,
                school.level.as_str(),
                school.ownership.as_str(),
                school.address,
                school.province_code,
                school.province_name,
                school.regency_code,
                school.regency_name,
                school.bps_district_code,
                school.bps_district_name,
                school.district_code,
                school.district_name,
                school.year,
                to_i64(school.student_count),
                school.accreditation.as_str(),
                school.created_at.to_rfc3339(),
                school.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(id = %school.id, npsn = %school.npsn, "School inserted");
        Ok(())
    }

    fn get_school(&self, id: &str) -> Result<Option<School>> {
        let conn = self.conn()?;
        let school = conn
            .query_row(
                &format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE id = ?1"),
                params![id],
                school_from_row,
            )
            .optional()?;
        Ok(school)
    }

    fn find_school_by_npsn(&self, npsn: &str) -> Result<Option<School>> {
        let conn = self.conn()?;
        let school = conn
            .query_row(
                &format!("SELECT {SCHOOL_COLUMNS} FROM schools WHERE npsn = ?1"),
                params![npsn],
                school_from_row,
            )
            .optional()?;
        Ok(school)
    }

    fn update_school(&self, school: &School) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
                UPDATE schools SET
                    name = ?2, npsn = ?3, level = ?4, ownership = ?5, address = ?6,
                    province_code = ?7, province_name = ?8, regency_code = ?9,
                    regency_name = ?10, bps_district_code = ?11, bps_district_name = ?12,
                    district_code = ?13, district_name = ?14, year = ?15,
                    student_count = ?16, accreditation = ?17, updated_at = ?18
                WHERE id = ?1
                "#,
            params![
                school.id,
                school.name,
                school.npsn,
                school.level.as_str(),
                school.ownership.as_str(),
                school.address,
                school.province_code,
                school.province_name,
                school.regency_code,
                school.regency_name,
                school.bps_district_code,
                school.bps_district_name,
                school.district_code,
                school.district_name,
                school.year,
                to_i64(school.student_count),
                school.accreditation.as_str(),
                school.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::not_found("School", school.id.clone()));
        }
        Ok(())
    }

    fn delete_school(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM schools WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_schools(&self, filter: &SchoolFilter, page: Pagination) -> Result<Page<School>> {
        let (items, total) = self.query_schools(filter, Some(page))?;
        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn find_schools(&self, filter: &SchoolFilter) -> Result<Vec<School>> {
        self.query_schools(filter, None).map(|(schools, _)| schools)
    }

    fn count_schools(&self) -> Result<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM schools", [], |row| row.get(0))?;
        Ok(to_u64(count))
    }

    fn update_student_counts(&self, updates: &[(String, u64)]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE schools SET student_count = ?2, updated_at = ?3 WHERE id = ?1",
            )?;
            for (id, count) in updates {
                written += stmt.execute(params![id, to_i64(*count), now])?;
            }
        }
        tx.commit()?;

        tracing::debug!(requested = updates.len(), written, "Student counts updated");
        Ok(written)
    }

    fn update_accreditations(&self, updates: &[(String, Accreditation)]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().to_rfc3339();
        let mut written = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE schools SET accreditation = ?2, updated_at = ?3 WHERE id = ?1",
            )?;
            for (id, accreditation) in updates {
                written += stmt.execute(params![id, accreditation.as_str(), now])?;
            }
        }
        tx.commit()?;

        tracing::debug!(requested = updates.len(), written, "Accreditations updated");
        Ok(written)
    }
}

impl StudentStatisticRepository for SqliteStore {
    fn insert_statistics(&self, statistics: &[StudentStatistic]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO student_statistics ({STATISTIC_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
            ))?;
            for s in statistics {
                stmt.execute(params![
                    s.id,
                    s.province_code,
                    s.province_name,
                    s.regency_code,
                    s.regency_name,
                    s.level.as_str(),
                    s.ownership.as_str(),
                    to_i64(s.student_count),
                    s.academic_year,
                    s.created_at.to_rfc3339(),
                    s.updated_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(statistics.len())
    }

    fn list_statistics(
        &self,
        filter: &StatisticFilter,
        page: Pagination,
    ) -> Result<Page<StudentStatistic>> {
        let (items, total) = self.query_statistics(filter, Some(page))?;
        Ok(Page {
            items,
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    fn find_statistics(&self, filter: &StatisticFilter) -> Result<Vec<StudentStatistic>> {
        self.query_statistics(filter, None).map(|(rows, _)| rows)
    }

    fn academic_years(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT academic_year FROM student_statistics ORDER BY academic_year",
        )?;
        let years = stmt
            .query_map([], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(years)
    }
}

impl ProgramRepository for SqliteStore {
    fn insert_program(&self, program: &EducationProgram) -> Result<()> {
        let conn = self.conn()?;
        if !Self::school_exists(&conn, &program.school_id)? {
            return Err(Error::validation(format!(
                "school_id does not reference an existing school: {}",
                program.school_id
            )));
        }

        conn.execute(
            r#"
                INSERT INTO education_programs
                    (id, name, year, recipients, school_id, npsn, description, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            params![
                program.id,
                program.name,
                program.year,
                to_i64(program.recipients),
                program.school_id,
                program.npsn,
                program.description,
                program.created_at.to_rfc3339(),
                program.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn get_program(&self, id: &str) -> Result<Option<ProgramWithSchool>> {
        let conn = self.conn()?;
        let program = conn
            .query_row(
                &format!(
                    "SELECT {PROGRAM_COLUMNS} FROM education_programs p \
                     LEFT JOIN schools s ON s.id = p.school_id WHERE p.id = ?1"
                ),
                params![id],
                program_with_school_from_row,
            )
            .optional()?;
        Ok(program)
    }

    fn update_program(&self, program: &EducationProgram) -> Result<()> {
        let conn = self.conn()?;
        if !Self::school_exists(&conn, &program.school_id)? {
            return Err(Error::validation(format!(
                "school_id does not reference an existing school: {}",
                program.school_id
            )));
        }

        let updated = conn.execute(
            r#"
                UPDATE education_programs SET
                    name = ?2, year = ?3, recipients = ?4, school_id = ?5,
                    npsn = ?6, description = ?7, updated_at = ?8
                WHERE id = ?1
                "#,
            params![
                program.id,
                program.name,
                program.year,
                to_i64(program.recipients),
                program.school_id,
                program.npsn,
                program.description,
                program.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::not_found("Program", program.id.clone()));
        }
        Ok(())
    }

    fn delete_program(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM education_programs WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_programs(&self) -> Result<Vec<ProgramWithSchool>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM education_programs p \
             LEFT JOIN schools s ON s.id = p.school_id ORDER BY p.year DESC, p.name"
        ))?;
        let programs = stmt
            .query_map([], program_with_school_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(programs)
    }

    fn programs_for_school(&self, school_id: &str) -> Result<Vec<EducationProgram>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROGRAM_COLUMNS} FROM education_programs p \
             LEFT JOIN schools s ON s.id = p.school_id \
             WHERE p.school_id = ?1 ORDER BY p.year DESC, p.name"
        ))?;
        let programs = stmt
            .query_map(params![school_id], |row| {
                program_with_school_from_row(row).map(|p| p.program)
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(programs)
    }
}

impl AdminRepository for SqliteStore {
    fn insert_admin(&self, admin: &Admin) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO admins ({ADMIN_COLUMNS}) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
            ),
            params![
                admin.id,
                admin.name,
                admin.email,
                admin.password_hash,
                admin.role.as_str(),
                admin.npsn,
                admin.school_id,
                admin.phone,
                admin.is_active,
                admin.last_login.map(|t| t.to_rfc3339()),
                admin.created_at.to_rfc3339(),
                admin.updated_at.to_rfc3339(),
            ],
        )?;

        tracing::debug!(id = %admin.id, role = %admin.role, "Admin inserted");
        Ok(())
    }

    fn get_admin(&self, id: &str) -> Result<Option<Admin>> {
        let conn = self.conn()?;
        let admin = conn
            .query_row(
                &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = ?1"),
                params![id],
                admin_from_row,
            )
            .optional()?;
        Ok(admin)
    }

    fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let conn = self.conn()?;
        let admin = conn
            .query_row(
                &format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = ?1"),
                params![email],
                admin_from_row,
            )
            .optional()?;
        Ok(admin)
    }

    fn update_admin(&self, admin: &Admin) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            r#"
                UPDATE admins SET
                    name = ?2, email = ?3, role = ?4, npsn = ?5, school_id = ?6,
                    phone = ?7, is_active = ?8, updated_at = ?9
                WHERE id = ?1
                "#,
            params![
                admin.id,
                admin.name,
                admin.email,
                admin.role.as_str(),
                admin.npsn,
                admin.school_id,
                admin.phone,
                admin.is_active,
                admin.updated_at.to_rfc3339(),
            ],
        )?;

        if updated == 0 {
            return Err(Error::not_found("Admin", admin.id.clone()));
        }
        Ok(())
    }

    fn delete_admin(&self, id: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute("DELETE FROM admins WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }

    fn list_admins(&self) -> Result<Vec<Admin>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at DESC, id"
        ))?;
        let admins = stmt
            .query_map([], admin_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(admins)
    }

    fn record_login(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE admins SET last_login = ?2 WHERE id = ?1",
            params![id, at.to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(Error::not_found("Admin", id));
        }
        Ok(())
    }

    fn set_password_hash(&self, id: &str, hash: &str) -> Result<()> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE admins SET password_hash = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, hash, Utc::now().to_rfc3339()],
        )?;
        if updated == 0 {
            return Err(Error::not_found("Admin", id));
        }
        Ok(())
    }
}

// ============================================================================
// Query helpers
// ============================================================================

fn school_where(filter: &SchoolFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(level) = filter.level {
        clauses.push("level = ?".to_string());
        values.push(Value::Text(level.as_str().to_string()));
    }
    if let Some(ownership) = filter.ownership {
        clauses.push("ownership = ?".to_string());
        values.push(Value::Text(ownership.as_str().to_string()));
    }
    if let Some(district) = non_blank(&filter.district) {
        clauses.push("district_name LIKE ? ESCAPE '\\'".to_string());
        values.push(Value::Text(like_pattern(district)));
    }
    if let Some(regency) = non_blank(&filter.regency) {
        clauses.push("regency_name LIKE ? ESCAPE '\\'".to_string());
        values.push(Value::Text(like_pattern(regency)));
    }
    if let Some(accreditation) = filter.accreditation {
        clauses.push("accreditation = ?".to_string());
        values.push(Value::Text(accreditation.as_str().to_string()));
    }
    if let Some(search) = non_blank(&filter.search) {
        clauses.push(
            "(name LIKE ? ESCAPE '\\' OR npsn LIKE ? ESCAPE '\\' OR address LIKE ? ESCAPE '\\')"
                .to_string(),
        );
        let pattern = like_pattern(search);
        values.extend(std::iter::repeat(Value::Text(pattern)).take(3));
    }

    (where_clause(&clauses), values)
}

fn statistic_where(filter: &StatisticFilter) -> (String, Vec<Value>) {
    let mut clauses = Vec::new();
    let mut values = Vec::new();

    if let Some(level) = filter.level {
        clauses.push("level = ?".to_string());
        values.push(Value::Text(level.as_str().to_string()));
    }
    if let Some(ownership) = filter.ownership {
        clauses.push("ownership = ?".to_string());
        values.push(Value::Text(ownership.as_str().to_string()));
    }
    if let Some(regency) = non_blank(&filter.regency) {
        clauses.push("regency_name LIKE ? ESCAPE '\\'".to_string());
        values.push(Value::Text(like_pattern(regency)));
    }
    if let Some(year) = non_blank(&filter.academic_year) {
        clauses.push("academic_year = ?".to_string());
        values.push(Value::Text(year.to_string()));
    }

    (where_clause(&clauses), values)
}

fn where_clause(clauses: &[String]) -> String {
    if clauses.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", clauses.join(" AND "))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Substring LIKE pattern with wildcards in the needle escaped
fn like_pattern(needle: &str) -> String {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn to_u64(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

// ============================================================================
// Row mapping
// ============================================================================

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn school_from_row(row: &Row<'_>) -> rusqlite::Result<School> {
    Ok(School {
        id: row.get(0)?,
        name: row.get(1)?,
        npsn: row.get(2)?,
        level: parse_column(row, 3)?,
        ownership: parse_column(row, 4)?,
        address: row.get(5)?,
        province_code: row.get(6)?,
        province_name: row.get(7)?,
        regency_code: row.get(8)?,
        regency_name: row.get(9)?,
        bps_district_code: row.get(10)?,
        bps_district_name: row.get(11)?,
        district_code: row.get(12)?,
        district_name: row.get(13)?,
        year: row.get(14)?,
        student_count: to_u64(row.get(15)?),
        accreditation: parse_column(row, 16)?,
        created_at: timestamp_column(row, 17)?,
        updated_at: timestamp_column(row, 18)?,
    })
}

fn statistic_from_row(row: &Row<'_>) -> rusqlite::Result<StudentStatistic> {
    Ok(StudentStatistic {
        id: row.get(0)?,
        province_code: row.get(1)?,
        province_name: row.get(2)?,
        regency_code: row.get(3)?,
        regency_name: row.get(4)?,
        level: parse_column(row, 5)?,
        ownership: parse_column(row, 6)?,
        student_count: to_u64(row.get(7)?),
        academic_year: row.get(8)?,
        created_at: timestamp_column(row, 9)?,
        updated_at: timestamp_column(row, 10)?,
    })
}

fn program_with_school_from_row(row: &Row<'_>) -> rusqlite::Result<ProgramWithSchool> {
    let program = EducationProgram {
        id: row.get(0)?,
        name: row.get(1)?,
        year: row.get(2)?,
        recipients: to_u64(row.get(3)?),
        school_id: row.get(4)?,
        npsn: row.get(5)?,
        description: row.get(6)?,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    };

    let school = match row.get::<_, Option<String>>(9)? {
        Some(id) => Some(SchoolRef {
            id,
            name: row.get(10)?,
            level: parse_column(row, 11)?,
        }),
        None => None,
    };

    Ok(ProgramWithSchool { program, school })
}

fn admin_from_row(row: &Row<'_>) -> rusqlite::Result<Admin> {
    let last_login = match row.get::<_, Option<String>>(9)? {
        Some(_) => Some(timestamp_column(row, 9)?),
        None => None,
    };

    Ok(Admin {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: parse_column(row, 4)?,
        npsn: row.get(5)?,
        school_id: row.get(6)?,
        phone: row.get(7)?,
        is_active: row.get(8)?,
        last_login,
        created_at: timestamp_column(row, 10)?,
        updated_at: timestamp_column(row, 11)?,
    })
}

// ============================================================================
// Shared Store
// ============================================================================

/// Thread-safe shared store handle
pub type SharedStore = Arc<SqliteStore>;

/// Open a shared SQLite store
pub fn create_sqlite_store(path: impl AsRef<Path>) -> Result<SharedStore> {
    Ok(Arc::new(SqliteStore::open(path)?))
}

// ============================================================================
// Tests
// ============================================================================
