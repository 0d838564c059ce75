use lotto645_db::models::{Draw, NumberStat, ReappearStat, MAX_NUMBER, POOL_SIZE};
use serde::Serialize;

use super::{latest_draw_no, ratio};

/// Num1 ne peut pas dépasser 40, Num6 ne peut pas être inférieur à 6.
const FIRST_DOMAIN: std::ops::RangeInclusive<u8> = 1..=40;
const LAST_DOMAIN: std::ops::RangeInclusive<u8> = 6..=45;

#[derive(Debug, Clone, Serialize)]
pub struct PositionStat {
    pub number: u8,
    pub count: u32,
    pub probability: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PositionStats {
    pub first: Vec<PositionStat>,
    pub last: Vec<PositionStat>,
    pub total_draws: usize,
    pub latest_draw_no: u32,
}

/// Fréquence de sortie de chaque numéro (principal et complémentaire).
pub fn number_stats(draws: &[Draw]) -> Option<Vec<NumberStat>> {
    if draws.is_empty() {
        return None;
    }

    let mut stats: Vec<NumberStat> = (1..=MAX_NUMBER)
        .map(|number| NumberStat {
            number,
            total_count: 0,
            bonus_count: 0,
            last_draw_no: 0,
        })
        .collect();

    for draw in draws {
        for &n in &draw.numbers {
            let stat = &mut stats[(n - 1) as usize];
            stat.total_count += 1;
            stat.last_draw_no = stat.last_draw_no.max(draw.draw_no);
        }
        let stat = &mut stats[(draw.bonus - 1) as usize];
        stat.bonus_count += 1;
        stat.last_draw_no = stat.last_draw_no.max(draw.draw_no);
    }

    Some(stats)
}

/// Probabilité qu'un numéro sorti au tirage k ressorte au tirage k+1.
pub fn reappear_stats(draws: &[Draw]) -> Option<Vec<ReappearStat>> {
    if draws.len() < 2 {
        return None;
    }

    let mut total_appear = [0u32; POOL_SIZE + 1];
    let mut reappear = [0u32; POOL_SIZE + 1];

    for pair in draws.windows(2) {
        let next = pair[1].presence();
        for &n in &pair[0].numbers {
            total_appear[n as usize] += 1;
            if next[n as usize] {
                reappear[n as usize] += 1;
            }
        }
    }

    let stats = (1..=MAX_NUMBER)
        .map(|number| {
            let idx = number as usize;
            let probability = if total_appear[idx] > 0 {
                reappear[idx] as f64 / total_appear[idx] as f64
            } else {
                0.0
            };
            ReappearStat {
                number,
                total_appear: total_appear[idx],
                reappear_count: reappear[idx],
                probability,
            }
        })
        .collect();

    Some(stats)
}

/// Fréquence de chaque numéro en première (Num1) et dernière (Num6) position.
pub fn position_stats(draws: &[Draw]) -> Option<PositionStats> {
    if draws.is_empty() {
        return None;
    }

    let mut first_counts = [0u32; POOL_SIZE + 1];
    let mut last_counts = [0u32; POOL_SIZE + 1];
    for draw in draws {
        first_counts[draw.first() as usize] += 1;
        last_counts[draw.last() as usize] += 1;
    }

    let total = draws.len();
    let to_stats = |domain: std::ops::RangeInclusive<u8>, counts: &[u32; POOL_SIZE + 1]| {
        domain
            .map(|number| PositionStat {
                number,
                count: counts[number as usize],
                probability: ratio(counts[number as usize], total),
            })
            .collect::<Vec<_>>()
    };

    Some(PositionStats {
        first: to_stats(FIRST_DOMAIN, &first_counts),
        last: to_stats(LAST_DOMAIN, &last_counts),
        total_draws: total,
        latest_draw_no: latest_draw_no(draws),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto645_db::models::make_test_draws;

    fn draw(draw_no: u32, numbers: [u8; 6], bonus: u8) -> Draw {
        Draw {
            draw_no,
            date: "2024-01-01".to_string(),
            numbers,
            bonus,
            first_prize: 0,
            first_winners: 0,
        }
    }

    #[test]
    fn test_empty_history_is_unavailable() {
        assert!(number_stats(&[]).is_none());
        assert!(position_stats(&[]).is_none());
        assert!(reappear_stats(&[]).is_none());
        assert!(reappear_stats(&make_test_draws(1)).is_none());
    }

    #[test]
    fn test_number_stats_match_occurrences() {
        let draws = make_test_draws(80);
        let stats = number_stats(&draws).unwrap();
        assert_eq!(stats.len(), 45);
        for stat in &stats {
            let expected = draws.iter().filter(|d| d.contains(stat.number)).count() as u32;
            assert_eq!(stat.total_count, expected, "numéro {}", stat.number);
        }
        let total: u32 = stats.iter().map(|s| s.total_count).sum();
        assert_eq!(total, 80 * 6);
    }

    #[test]
    fn test_number_stats_bonus_and_last_draw() {
        let draws = vec![
            draw(1, [1, 2, 3, 4, 5, 6], 7),
            draw(2, [8, 9, 10, 11, 12, 13], 1),
        ];
        let stats = number_stats(&draws).unwrap();
        assert_eq!(stats[0].total_count, 1);
        assert_eq!(stats[0].bonus_count, 1);
        assert_eq!(stats[0].last_draw_no, 2);
        assert_eq!(stats[6].bonus_count, 1);
        assert_eq!(stats[6].last_draw_no, 1);
        assert_eq!(stats[44].last_draw_no, 0);
    }

    #[test]
    fn test_reappear_counts() {
        let draws = vec![
            draw(1, [1, 2, 3, 4, 5, 6], 7),
            draw(2, [1, 2, 10, 11, 12, 13], 7),
            draw(3, [1, 20, 21, 22, 23, 24], 7),
        ];
        let stats = reappear_stats(&draws).unwrap();
        // 1 : présent en 1 et 2 (deux paires), ressorti les deux fois
        assert_eq!(stats[0].total_appear, 2);
        assert_eq!(stats[0].reappear_count, 2);
        assert!((stats[0].probability - 1.0).abs() < 1e-12);
        // 2 : ressorti une fois sur deux
        assert_eq!(stats[1].total_appear, 2);
        assert_eq!(stats[1].reappear_count, 1);
        // 24 : uniquement dans le dernier tirage
        assert_eq!(stats[23].total_appear, 0);
        assert_eq!(stats[23].probability, 0.0);
    }

    #[test]
    fn test_position_domains() {
        let draws = vec![
            draw(1, [1, 2, 3, 4, 5, 45], 7),
            draw(2, [3, 9, 10, 11, 12, 13], 7),
        ];
        let stats = position_stats(&draws).unwrap();
        assert_eq!(stats.first.len(), 40);
        assert_eq!(stats.last.len(), 40);
        assert_eq!(stats.first[0].number, 1);
        assert_eq!(stats.last[0].number, 6);
        assert_eq!(stats.first[2].count, 1);
        assert!((stats.first[2].probability - 0.5).abs() < 1e-12);
        assert_eq!(stats.last.last().unwrap().count, 1);
        assert_eq!(stats.latest_draw_no, 2);
    }
}
