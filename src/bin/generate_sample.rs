//! Writes `sample_cognacy.csv`, a synthetic word list with three subgroups,
//! for trying out the plots without real survey data.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const CONCEPTS: usize = 40;
const GROUP_INNOVATION: f64 = 0.3;
const ITEM_INNOVATION: f64 = 0.1;
const MISSING: f64 = 0.08;

const ONSETS: [&str; 12] = ["p", "b", "t", "d", "k", "g", "ʦ", "ʨ", "s", "m", "n", "l"];
const NUCLEI: [&str; 6] = ["a", "e", "i", "o", "u", "ə"];

fn random_form(rng: &mut StdRng) -> String {
    let syllables = rng.gen_range(1..=2);
    (0..syllables)
        .map(|_| {
            let onset = ONSETS.choose(rng).copied().unwrap_or("");
            let nucleus = NUCLEI.choose(rng).copied().unwrap_or("a");
            format!("{onset}{nucleus}")
        })
        .collect()
}

fn main() -> Result<()> {
    let mut rng = StdRng::seed_from_u64(42);

    let groups: [(&str, &[&str]); 3] = [
        ("West", &["Duhumbi", "Khispi", "Rupa", "Shergaon"]),
        ("East", &["Bugun", "Sartang", "Lishpa"]),
        ("Outgroup", &["Hruso", "Miji"]),
    ];
    let items: Vec<&str> = groups.iter().flat_map(|(_, members)| members.iter().copied()).collect();

    // cognacy[item][concept], None = no data.
    let mut cognacy: Vec<Vec<Option<u32>>> = vec![Vec::with_capacity(CONCEPTS); items.len()];
    let mut forms: Vec<Vec<String>> = vec![Vec::with_capacity(CONCEPTS); items.len()];

    for _ in 0..CONCEPTS {
        let mut next_class = 2;
        let mut item = 0;
        for (_, members) in &groups {
            let group_class = if rng.gen_bool(GROUP_INNOVATION) {
                next_class += 1;
                next_class - 1
            } else {
                1
            };
            let group_form = random_form(&mut rng);
            for _ in members.iter() {
                if rng.gen_bool(MISSING) {
                    cognacy[item].push(None);
                    forms[item].push(String::new());
                } else if rng.gen_bool(ITEM_INNOVATION) {
                    cognacy[item].push(Some(next_class));
                    next_class += 1;
                    forms[item].push(random_form(&mut rng));
                } else {
                    cognacy[item].push(Some(group_class));
                    forms[item].push(group_form.clone());
                }
                item += 1;
            }
        }
    }

    let output_path = "sample_cognacy.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    let mut header = vec!["Concept".to_string()];
    for k in 1..=CONCEPTS {
        header.push(format!("C{k:03}"));
        header.push("cognacy".to_string());
    }
    writer.write_record(&header)?;

    let mut groups_row = vec!["#subgroups: West, East, Outgroup".to_string()];
    groups_row.resize(header.len(), String::new());
    writer.write_record(&groups_row)?;

    for (i, name) in items.iter().enumerate() {
        let mut record = vec![name.to_string()];
        for k in 0..CONCEPTS {
            record.push(forms[i][k].clone());
            record.push(match cognacy[i][k] {
                Some(c) => c.to_string(),
                None => "NA".to_string(),
            });
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    println!(
        "Wrote {} items ({CONCEPTS} concepts each) to {output_path}",
        items.len()
    );
    Ok(())
}
