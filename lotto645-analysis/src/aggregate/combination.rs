use lotto645_db::models::{Draw, PICK_COUNT};
use serde::Serialize;
use std::collections::HashMap;

use super::{latest_draw_no, ranked, ratio};

const CONSECUTIVE_BUCKETS: [u8; 6] = [0, 2, 3, 4, 5, 6];
const MAX_EXAMPLES: usize = 10;

#[derive(Debug, Clone, Serialize)]
pub struct PairStat {
    pub first: u8,
    pub second: u8,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PairStats {
    /// Paires les plus fréquentes, effectif décroissant.
    pub top: Vec<PairStat>,
    /// Paires les moins fréquentes (parmi celles observées), effectif croissant.
    pub bottom: Vec<PairStat>,
    /// Nombre total d'observations de paires : 15 par tirage.
    pub total_pairs: u64,
    pub distinct_pairs: usize,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsecutiveCountStat {
    pub run_length: u8,
    pub draw_count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsecutiveExample {
    pub draw_no: u32,
    pub numbers: [u8; 6],
    pub run_length: u8,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConsecutiveStats {
    pub buckets: Vec<ConsecutiveCountStat>,
    pub recent_examples: Vec<ConsecutiveExample>,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

/// Co-occurrence des 15 paires non ordonnées de chaque tirage.
pub fn pair_stats(draws: &[Draw], top_n: usize) -> Option<PairStats> {
    if draws.is_empty() {
        return None;
    }

    let mut counts: HashMap<(u8, u8), u32> = HashMap::new();
    let mut total_pairs = 0u64;
    for draw in draws {
        for i in 0..PICK_COUNT {
            for j in (i + 1)..PICK_COUNT {
                let (a, b) = (draw.numbers[i], draw.numbers[j]);
                *counts.entry((a.min(b), a.max(b))).or_insert(0) += 1;
                total_pairs += 1;
            }
        }
    }

    let total = draws.len();
    let to_stat = |&((first, second), count): &((u8, u8), u32)| PairStat {
        first,
        second,
        count,
        probability: ratio(count, total),
    };

    let entries = ranked(&counts);
    let n = top_n.min(entries.len());
    let top = entries[..n].iter().map(to_stat).collect();
    let mut bottom: Vec<PairStat> = entries[entries.len() - n..].iter().map(to_stat).collect();
    bottom.sort_by(|a, b| a.count.cmp(&b.count).then_with(|| (a.first, a.second).cmp(&(b.first, b.second))));

    Some(PairStats {
        top,
        bottom,
        total_pairs,
        distinct_pairs: entries.len(),
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}

/// Plus longue suite d'entiers consécutifs ; une suite de longueur 1 compte pour 0.
pub fn longest_run(numbers: &[u8; 6]) -> u8 {
    let mut sorted = *numbers;
    sorted.sort_unstable();

    let mut best = 1u8;
    let mut current = 1u8;
    for w in sorted.windows(2) {
        if w[1] == w[0] + 1 {
            current += 1;
            best = best.max(current);
        } else {
            current = 1;
        }
    }
    if best == 1 {
        0
    } else {
        best
    }
}

pub fn consecutive_stats(draws: &[Draw]) -> Option<ConsecutiveStats> {
    if draws.is_empty() {
        return None;
    }

    let mut counts: HashMap<u8, u32> = HashMap::new();
    for draw in draws {
        *counts.entry(longest_run(&draw.numbers)).or_insert(0) += 1;
    }

    let total = draws.len();
    let buckets = CONSECUTIVE_BUCKETS
        .iter()
        .map(|&run_length| {
            let draw_count = counts.get(&run_length).copied().unwrap_or(0);
            ConsecutiveCountStat {
                run_length,
                draw_count,
                probability: ratio(draw_count, total),
            }
        })
        .collect();

    let recent_examples = draws
        .iter()
        .rev()
        .filter_map(|draw| {
            let run_length = longest_run(&draw.numbers);
            (run_length >= 2).then(|| ConsecutiveExample {
                draw_no: draw.draw_no,
                numbers: draw.numbers,
                run_length,
            })
        })
        .take(MAX_EXAMPLES)
        .collect();

    Some(ConsecutiveStats {
        buckets,
        recent_examples,
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}
