//! Common test utilities

use edumon::models::{
    Accreditation, Level, NewProgram, NewSchool, NewStudentStatistic, Ownership, School,
    StudentStatistic,
};

/// Create a school payload with default values
pub fn new_school(name: &str, npsn: &str, level: Level, ownership: Ownership) -> NewSchool {
    NewSchool {
        name: name.to_string(),
        npsn: npsn.to_string(),
        level,
        ownership,
        address: format!("Jl. {name}"),
        province_code: "32".to_string(),
        province_name: "JAWA BARAT".to_string(),
        regency_code: "3273".to_string(),
        regency_name: "KOTA BANDUNG".to_string(),
        bps_district_code: String::new(),
        bps_district_name: String::new(),
        district_code: "327301".to_string(),
        district_name: "Sukasari".to_string(),
        year: 2023,
        student_count: 0,
        accreditation: Accreditation::default(),
    }
}

/// Create a stored school in a given regency and district
#[allow(dead_code)]
pub fn school_in(
    name: &str,
    npsn: &str,
    level: Level,
    ownership: Ownership,
    regency: &str,
    district: &str,
) -> School {
    NewSchool {
        regency_name: regency.to_string(),
        district_name: district.to_string(),
        ..new_school(name, npsn, level, ownership)
    }
    .into_school()
}

/// Create a statistic row
#[allow(dead_code)]
pub fn statistic(
    regency: &str,
    level: Level,
    ownership: Ownership,
    student_count: u64,
    academic_year: &str,
) -> StudentStatistic {
    NewStudentStatistic {
        province_code: "32".to_string(),
        province_name: "JAWA BARAT".to_string(),
        regency_code: String::new(),
        regency_name: regency.to_string(),
        level,
        ownership,
        student_count,
        academic_year: academic_year.to_string(),
    }
    .into_statistic()
    .unwrap()
}

/// Create a program payload
#[allow(dead_code)]
pub fn new_program(id: &str, school_id: &str, year: i32, recipients: u64) -> NewProgram {
    NewProgram {
        id: id.to_string(),
        name: format!("Program {id}"),
        year,
        recipients,
        school_id: school_id.to_string(),
        npsn: String::new(),
        description: String::new(),
    }
}
