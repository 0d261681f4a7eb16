//! Covariate-pattern indexing.
//!
//! The 216 patterns are laid out in nested blocks: age indicator (108), menarche (36),
//! biopsy count (12), first live birth (3), relatives (1). Indices are 1-based to match
//! the published model tables.

use crate::error::RiskModelError;
use crate::recode::CovariateCategories;
use crate::tables::COEFFICIENT_COUNT;
use serde::Serialize;

pub const PATTERN_COUNT: usize = 216;
/// Patterns per age-indicator half; also the distance between a pattern and its mirror.
pub const AGE_HALF: usize = 108;

const MENARCHE_STRIDE: usize = 36;
const BIOPSY_STRIDE: usize = 12;
const FIRST_BIRTH_STRIDE: usize = 3;

const AGE_LEVELS: u8 = 2;
const MENARCHE_LEVELS: u8 = 3;
const BIOPSY_LEVELS: u8 = 3;
const FIRST_BIRTH_LEVELS: u8 = 4;
const RELATIVE_LEVELS: u8 = 3;

/// A 1-based covariate pattern index in `[1, 216]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PatternIndex(usize);

impl PatternIndex {
    pub fn new(index: usize) -> Result<Self, RiskModelError> {
        if (1..=PATTERN_COUNT).contains(&index) {
            Ok(Self(index))
        } else {
            Err(RiskModelError::PatternIndexOutOfRange(index))
        }
    }

    #[inline]
    pub fn get(self) -> usize {
        self.0
    }

    /// Zero-based position in a 216-entry table.
    #[inline]
    pub fn offset(self) -> usize {
        self.0 - 1
    }

    #[inline]
    pub fn is_age_50_or_over(self) -> bool {
        self.0 > AGE_HALF
    }

    /// The pattern sharing every non-age covariate but with the other age indicator.
    #[inline]
    pub fn mirror(self) -> Self {
        if self.is_age_50_or_over() {
            Self(self.0 - AGE_HALF)
        } else {
            Self(self.0 + AGE_HALF)
        }
    }

    pub fn all() -> impl Iterator<Item = PatternIndex> {
        (1..=PATTERN_COUNT).map(PatternIndex)
    }
}

pub struct PatternIndexer;

impl PatternIndexer {
    pub fn index(categories: &CovariateCategories) -> Result<PatternIndex, RiskModelError> {
        let in_range = categories.age_indicator < AGE_LEVELS
            && categories.menarche < MENARCHE_LEVELS
            && categories.biopsy_count < BIOPSY_LEVELS
            && categories.first_birth < FIRST_BIRTH_LEVELS
            && categories.relatives < RELATIVE_LEVELS;
        if !in_range {
            return Err(RiskModelError::PatternOutOfRange {
                age_indicator: categories.age_indicator,
                menarche: categories.menarche,
                biopsy_count: categories.biopsy_count,
                first_birth: categories.first_birth,
                relatives: categories.relatives,
            });
        }
        let offset = usize::from(categories.age_indicator) * AGE_HALF
            + usize::from(categories.menarche) * MENARCHE_STRIDE
            + usize::from(categories.biopsy_count) * BIOPSY_STRIDE
            + usize::from(categories.first_birth) * FIRST_BIRTH_STRIDE
            + usize::from(categories.relatives);
        Ok(PatternIndex(offset + 1))
    }

    pub fn decode(pattern: PatternIndex) -> CovariateCategories {
        let offset = pattern.offset();
        let level = |stride: usize, levels: u8| ((offset / stride) % usize::from(levels)) as u8;
        CovariateCategories {
            age_indicator: level(AGE_HALF, AGE_LEVELS),
            menarche: level(MENARCHE_STRIDE, MENARCHE_LEVELS),
            biopsy_count: level(BIOPSY_STRIDE, BIOPSY_LEVELS),
            first_birth: level(FIRST_BIRTH_STRIDE, FIRST_BIRTH_LEVELS),
            relatives: level(1, RELATIVE_LEVELS),
        }
    }
}

/// Design row for a pattern: intercept, age indicator, menarche, biopsies, first birth,
/// relatives, biopsies x age indicator, first birth x relatives.
pub fn design_vector(pattern: PatternIndex) -> [f64; COEFFICIENT_COUNT] {
    let categories = PatternIndexer::decode(pattern);
    let age = f64::from(categories.age_indicator);
    let menarche = f64::from(categories.menarche);
    let biopsies = f64::from(categories.biopsy_count);
    let first_birth = f64::from(categories.first_birth);
    let relatives = f64::from(categories.relatives);
    [
        1.0,
        age,
        menarche,
        biopsies,
        first_birth,
        relatives,
        age * biopsies,
        first_birth * relatives,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn every_tuple() -> Vec<CovariateCategories> {
        let mut tuples = Vec::with_capacity(PATTERN_COUNT);
        for age_indicator in 0..AGE_LEVELS {
            for menarche in 0..MENARCHE_LEVELS {
                for biopsy_count in 0..BIOPSY_LEVELS {
                    for first_birth in 0..FIRST_BIRTH_LEVELS {
                        for relatives in 0..RELATIVE_LEVELS {
                            tuples.push(CovariateCategories {
                                age_indicator,
                                menarche,
                                biopsy_count,
                                first_birth,
                                relatives,
                            });
                        }
                    }
                }
            }
        }
        tuples
    }

    #[test]
    fn index_is_a_bijection() {
        let mut seen = HashSet::new();
        for (position, tuple) in every_tuple().iter().enumerate() {
            let pattern = PatternIndexer::index(tuple).unwrap();
            assert_eq!(pattern.get(), position + 1);
            assert_eq!(PatternIndexer::decode(pattern), *tuple);
            assert!(seen.insert(pattern));
        }
        assert_eq!(seen.len(), PATTERN_COUNT);
    }

    #[test]
    fn known_pattern_positions() {
        let scenario = CovariateCategories {
            age_indicator: 0,
            menarche: 2,
            biopsy_count: 1,
            first_birth: 0,
            relatives: 0,
        };
        assert_eq!(PatternIndexer::index(&scenario).unwrap().get(), 85);
        assert_eq!(
            PatternIndexer::index(&CovariateCategories::baseline(1))
                .unwrap()
                .get(),
            109
        );
    }

    #[test]
    fn categories_beyond_cardinality_are_rejected() {
        let mut tuple = CovariateCategories::baseline(0);
        tuple.first_birth = 4;
        assert!(matches!(
            PatternIndexer::index(&tuple),
            Err(RiskModelError::PatternOutOfRange { first_birth: 4, .. })
        ));
        tuple.first_birth = 0;
        tuple.age_indicator = 2;
        assert!(PatternIndexer::index(&tuple).is_err());
    }

    #[test]
    fn pattern_bounds_are_checked() {
        assert!(PatternIndex::new(0).is_err());
        assert!(PatternIndex::new(217).is_err());
        assert_eq!(PatternIndex::new(216).unwrap().offset(), 215);
    }

    #[test]
    fn mirror_flips_only_the_age_indicator() {
        for pattern in PatternIndex::all() {
            let mirrored = pattern.mirror();
            assert_eq!(mirrored.mirror(), pattern);
            let a = PatternIndexer::decode(pattern);
            let b = PatternIndexer::decode(mirrored);
            assert_ne!(a.age_indicator, b.age_indicator);
            assert_eq!(
                (a.menarche, a.biopsy_count, a.first_birth, a.relatives),
                (b.menarche, b.biopsy_count, b.first_birth, b.relatives)
            );
        }
    }

    #[test]
    fn design_vector_matches_block_layout() {
        // Fill columns block by block, the way the published tables lay them out.
        let mut blocks = vec![[0.0f64; COEFFICIENT_COUNT]; PATTERN_COUNT];
        for (k, row) in blocks.iter_mut().enumerate() {
            row[0] = 1.0;
            row[1] = if k < AGE_HALF { 0.0 } else { 1.0 };
        }
        for half in 0..2 {
            for level in 0..3 {
                for k in 0..MENARCHE_STRIDE {
                    blocks[half * AGE_HALF + level * MENARCHE_STRIDE + k][2] = level as f64;
                }
            }
        }
        for block in 0..6 {
            for level in 0..3 {
                for k in 0..BIOPSY_STRIDE {
                    blocks[block * MENARCHE_STRIDE + level * BIOPSY_STRIDE + k][3] = level as f64;
                }
            }
        }
        for block in 0..18 {
            for level in 0..4 {
                for k in 0..FIRST_BIRTH_STRIDE {
                    blocks[block * BIOPSY_STRIDE + level * FIRST_BIRTH_STRIDE + k][4] =
                        level as f64;
                }
            }
        }
        for block in 0..72 {
            for level in 0..3 {
                blocks[block * FIRST_BIRTH_STRIDE + level][5] = level as f64;
            }
        }
        for row in blocks.iter_mut() {
            row[6] = row[1] * row[3];
            row[7] = row[4] * row[5];
        }

        for pattern in PatternIndex::all() {
            assert_eq!(design_vector(pattern), blocks[pattern.offset()]);
        }
    }
}
