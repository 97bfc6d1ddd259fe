use super::node::TopNState;

/// Tier assignment for one timestep's outputs.
#[derive(Debug, Default)]
pub(crate) struct TopN {
    /// flags[class] = tier; classes past the output length are `AlsoRan`.
    pub flags: Vec<TopNState>,
    pub top_code: Option<u32>,
    pub second_code: Option<u32>,
    /// (class, probability, tier) best first.
    pub ranked: Vec<(u32, f32, TopNState)>,
}

impl TopN {
    pub fn flag(&self, code: u32) -> TopNState {
        self.flags
            .get(code as usize)
            .copied()
            .unwrap_or(TopNState::AlsoRan)
    }

    /// Select the `top_n` most probable classes. The best two are `Top2`,
    /// the others `TopN`. The null class is always `Top2`.
    ///
    /// Ties go to the lower class index.
    pub fn compute(
        &mut self,
        outputs: &[f32],
        num_classes: usize,
        top_n: usize,
        null: Option<u32>,
    ) {
        self.flags.clear();
        self.flags
            .resize(num_classes.max(outputs.len()), TopNState::AlsoRan);
        self.ranked.clear();

        let mut order: Vec<u32> = (0..outputs.len() as u32).collect();
        order.sort_by(|&a, &b| {
            outputs[b as usize]
                .total_cmp(&outputs[a as usize])
                .then(a.cmp(&b))
        });
        order.truncate(top_n);

        self.top_code = order.first().copied();
        self.second_code = order.get(1).copied();
        for (rank, &class) in order.iter().enumerate() {
            let tier = if rank < 2 {
                TopNState::Top2
            } else {
                TopNState::TopN
            };
            self.flags[class as usize] = tier;
            self.ranked.push((class, outputs[class as usize], tier));
        }
        if let Some(null) = null {
            if let Some(flag) = self.flags.get_mut(null as usize) {
                *flag = TopNState::Top2;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers() {
        let mut top = TopN::default();
        top.compute(&[0.1, 0.5, 0.05, 0.3, 0.02, 0.03], 6, 3, Some(5));
        assert_eq!(top.top_code, Some(1));
        assert_eq!(top.second_code, Some(3));
        assert_eq!(top.flag(1), TopNState::Top2);
        assert_eq!(top.flag(3), TopNState::Top2);
        assert_eq!(top.flag(0), TopNState::TopN);
        assert_eq!(top.flag(2), TopNState::AlsoRan);
        assert_eq!(top.flag(5), TopNState::Top2);
        assert_eq!(top.flag(99), TopNState::AlsoRan);
        assert_eq!(top.ranked.len(), 3);
    }

    #[test]
    fn test_ties_prefer_lower_index() {
        let mut top = TopN::default();
        top.compute(&[0.25, 0.25, 0.25, 0.25], 4, 2, None);
        assert_eq!(top.top_code, Some(0));
        assert_eq!(top.second_code, Some(1));
        assert_eq!(top.flag(2), TopNState::AlsoRan);
    }

    #[test]
    fn test_short_outputs() {
        let mut top = TopN::default();
        top.compute(&[0.9], 3, 5, Some(2));
        assert_eq!(top.top_code, Some(0));
        assert_eq!(top.second_code, None);
        assert_eq!(top.flag(1), TopNState::AlsoRan);
        assert_eq!(top.flag(2), TopNState::Top2);
    }
}
