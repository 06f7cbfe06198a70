use std::time::Instant;

use log::{debug, info};
use rand::Rng;

use super::{AnnealingParams, Budget};
use crate::decomp::{DecompTree, Neighborhood};
use crate::error::DecompError;
use crate::graph::Graph;
use crate::matching::Matcher;
use crate::progress::{Progress, ProgressSink};

/// Simulated annealing over decomposition trees, minimizing
/// [`DecompTree::fitness`].
pub struct Annealer<'a, R: Rng> {
    graph: &'a Graph,
    rng: R,
    init_decomp: DecompTree,
    operator: Neighborhood,
    init_temp: f64,
    cooling_rate: f64,
    cooling_period: Option<usize>,
    min_temp: f64,
    restart_from_best: bool,
    reheats: usize,
    current_score: Option<usize>,
}

impl<'a, R: Rng> Annealer<'a, R> {
    pub fn from_decomp(graph: &'a Graph, init_decomp: DecompTree, rng: R) -> Self {
        let params = AnnealingParams::default();
        Self {
            graph,
            rng,
            init_decomp,
            operator: params.operator,
            init_temp: params.start_temp,
            cooling_rate: params.multiplier,
            cooling_period: params.period,
            min_temp: params.floor,
            restart_from_best: params.restart_from_best,
            reheats: 0,
            current_score: None,
        }
    }

    pub fn set_params(&mut self, params: &AnnealingParams) -> &mut Self {
        self.operator = params.operator;
        self.init_temp = params.start_temp;
        self.cooling_rate = params.multiplier;
        self.cooling_period = params.period;
        self.min_temp = params.floor;
        self.restart_from_best = params.restart_from_best;
        self
    }

    pub fn set_operator(&mut self, operator: Neighborhood) -> &mut Self {
        self.operator = operator;
        self
    }

    pub fn set_init_temp(&mut self, init_temp: f64) -> &mut Self {
        self.init_temp = init_temp;
        self
    }

    pub fn set_cooling_rate(&mut self, cooling_rate: f64) -> &mut Self {
        self.cooling_rate = cooling_rate;
        self
    }

    /// Number of iterations between two cooling steps. Defaults to the
    /// square root of the number of vertices.
    pub fn set_cooling_period(&mut self, cooling_period: usize) -> &mut Self {
        self.cooling_period = Some(cooling_period);
        self
    }

    pub fn set_min_temp(&mut self, min_temp: f64) -> &mut Self {
        self.min_temp = min_temp;
        self
    }

    /// Whether the search jumps back to the best tree whenever the
    /// temperature is reset.
    pub fn set_restart_from_best(&mut self, restart_from_best: bool) -> &mut Self {
        self.restart_from_best = restart_from_best;
        self
    }

    /// How often the temperature was reset during the last run.
    pub fn reheats(&self) -> usize {
        self.reheats
    }

    /// Fitness of the tree the last run ended on, which need not be the best
    /// one it saw.
    pub fn current_fitness(&self) -> Option<usize> {
        self.current_score
    }

    fn period(&self) -> usize {
        self.cooling_period
            .unwrap_or_else(|| (self.graph.num_vertices() as f64).sqrt() as usize)
            .max(1)
    }

    pub fn run(
        &mut self,
        matcher: &mut Matcher,
        budget: &Budget,
        sink: &mut impl ProgressSink,
    ) -> Result<DecompTree, DecompError> {
        if self.init_temp <= 0.0 || self.cooling_period == Some(0) {
            return Err(DecompError::Unsupported(format!(
                "annealing needs a positive temperature and cooling period (got {} and {:?})",
                self.init_temp, self.cooling_period
            )));
        }

        let start = Instant::now();
        let period = self.period();
        let mut old_decomp = self.init_decomp.clone();
        let mut old_score = old_decomp.fitness(self.graph, matcher);
        let mut best_decomp = old_decomp.clone();
        let mut best_score = old_score;
        let mut temp = self.init_temp;
        let mut iterations = 0;
        self.reheats = 0;

        sink.report(Progress {
            width: best_decomp.mm_width(self.graph, matcher),
            fitness: best_score,
            elapsed: start.elapsed(),
            iterations,
        });

        while !budget.exhausted(start, iterations) {
            let decomp = self
                .operator
                .neighbor(self.graph, matcher, &old_decomp, &mut self.rng)?;
            let score = decomp.fitness(self.graph, matcher);

            if score < best_score {
                best_score = score;
                best_decomp = decomp.clone();
                sink.report(Progress {
                    width: best_decomp.mm_width(self.graph, matcher),
                    fitness: best_score,
                    elapsed: start.elapsed(),
                    iterations,
                });
            }

            let keep = if score < old_score {
                true
            } else {
                let delta = old_score as f64 - score as f64;
                self.rng.random::<f64>() < (delta / temp).exp()
            };
            if keep {
                old_score = score;
                old_decomp = decomp;
            }

            iterations += 1;
            if iterations % period == 0 {
                temp *= self.cooling_rate;
                if temp <= self.min_temp {
                    debug!("SA: reheating after {} iterations", iterations);
                    temp = self.init_temp;
                    self.reheats += 1;
                    if self.restart_from_best {
                        old_decomp = best_decomp.clone();
                        old_score = best_score;
                    }
                }
            }
        }

        self.current_score = Some(old_score);
        info!(
            "SA{}: fitness {} -> {} in {} iterations, {} reheats",
            self.operator,
            self.init_decomp.fitness(self.graph, matcher),
            best_score,
            iterations,
            self.reheats
        );
        Ok(best_decomp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomp::{bottom_up, BottomUpHeuristic};
    use crate::matching::MatcherKind;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;
    use rstest::rstest;

    fn random_tree(g: &Graph, rng: &mut SmallRng) -> DecompTree {
        let mut m = Matcher::new();
        bottom_up(
            g,
            &mut m,
            BottomUpHeuristic::CompletelyRandom,
            MatcherKind::HopcroftKarp,
            rng,
        )
        .unwrap()
    }

    #[rstest]
    fn best_only_improves(
        #[values(Neighborhood::UncleSwap, Neighborhood::TwoSwap, Neighborhood::Sharmin)] op: Neighborhood,
        #[values(false, true)] restart_from_best: bool,
    ) {
        let g = Graph::grid(4, 4).unwrap();
        let mut rng = SmallRng::seed_from_u64(42);
        let init = random_tree(&g, &mut rng);
        let mut m = Matcher::new();
        let init_score = init.fitness(&g, &mut m);

        let mut events = Vec::new();
        let mut annealer = Annealer::from_decomp(&g, init, rng);
        annealer
            .set_operator(op)
            .set_init_temp(50.0)
            .set_cooling_period(4)
            .set_restart_from_best(restart_from_best);
        let best = annealer
            .run(&mut m, &Budget::iterations(300), &mut events)
            .unwrap();

        assert!(best.validate(&g.vertex_set()).is_ok());
        let score = best.fitness(&g, &mut m);
        assert!(score <= init_score);
        assert_eq!(events.first().map(|p| p.fitness), Some(init_score));
        assert_eq!(events.last().map(|p| p.fitness), Some(score));
        for w in events.windows(2) {
            assert!(w[1].fitness < w[0].fitness);
            assert!(w[1].width <= w[0].width);
            assert!(w[1].iterations >= w[0].iterations);
        }
    }

    #[test]
    fn rejects_zero_period() {
        let g = Graph::grid(2, 2).unwrap();
        let mut rng = SmallRng::seed_from_u64(0);
        let init = random_tree(&g, &mut rng);
        let mut m = Matcher::new();
        let mut annealer = Annealer::from_decomp(&g, init, rng);
        annealer.set_cooling_period(0);
        assert!(matches!(
            annealer.run(&mut m, &Budget::iterations(10), &mut ()),
            Err(DecompError::Unsupported(_))
        ));
    }

    #[rstest]
    #[case(true)]
    #[case(false)]
    fn reheats_every_cooling_step(#[case] restart_from_best: bool) {
        let g = Graph::grid(4, 4).unwrap();
        let mut rng = SmallRng::seed_from_u64(3);
        let init = random_tree(&g, &mut rng);
        let mut m = Matcher::new();

        let mut annealer = Annealer::from_decomp(&g, init, rng);
        annealer
            .set_init_temp(10.0)
            .set_cooling_rate(0.99)
            .set_min_temp(9.95)
            .set_cooling_period(1)
            .set_restart_from_best(restart_from_best);
        let best = annealer
            .run(&mut m, &Budget::iterations(25), &mut ())
            .unwrap();

        assert_eq!(annealer.reheats(), 25);
        if restart_from_best {
            assert_eq!(annealer.current_fitness(), Some(best.fitness(&g, &mut m)));
        }
    }

    #[test]
    fn no_reheat_above_floor() {
        let g = Graph::grid(3, 3).unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        let init = random_tree(&g, &mut rng);
        let mut m = Matcher::new();

        let mut annealer = Annealer::from_decomp(&g, init, rng);
        annealer
            .set_init_temp(10.0)
            .set_cooling_rate(0.5)
            .set_min_temp(0.0)
            .set_cooling_period(1);
        annealer
            .run(&mut m, &Budget::iterations(20), &mut ())
            .unwrap();
        assert_eq!(annealer.reheats(), 0);
        assert!(annealer.current_fitness().is_some());
    }
}
