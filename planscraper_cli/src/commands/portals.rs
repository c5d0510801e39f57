use planscraper_lib::PORTALS;
use tabled::{Table, Tabled};

#[derive(Tabled)]
struct PortalRow {
    #[tabled(rename = "Website")]
    website: &'static str,
    #[tabled(rename = "Implementation")]
    implementation: &'static str,
}

pub fn run() {
    let rows: Vec<PortalRow> = PORTALS
        .iter()
        .map(|&(website, implementation)| PortalRow {
            website,
            implementation,
        })
        .collect();
    println!("{}", Table::new(rows));
}
