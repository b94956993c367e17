//! Linear-chain CRF Example: Part-of-Speech Tagging
//!
//! Scores a tagged sentence with indicator features, then runs one step of
//! gradient descent on the negative log-likelihood and decodes the result.

use chain_crf::{
    check_objective_gradient, instance_neg_log_likelihood, CrfObjective, Feature,
    GradientCheckConfig, ModelParams,
};
use scirs2_core::ndarray::{Array1, Array2};

const TAGS: [&str; 3] = ["Noun", "Verb", "Adj"];
const VOCAB: [&str; 5] = ["fox", "jumps", "quick", "the", "runs"];

/// Emission indicators tie (word, tag) to one parameter; transition
/// indicators tie (tag, tag) to one parameter after the emissions.
fn sentence_features(words: &[usize]) -> Vec<Feature> {
    let k = TAGS.len();
    let emissions = words.iter().enumerate().flat_map(move |(pos, &word)| {
        (0..k).map(move |tag| Feature::node(pos, tag, word * k + tag))
    });
    let transitions = (0..words.len().saturating_sub(1)).flat_map(move |pos| {
        (0..k * k).map(move |t| {
            Feature::edge((pos, pos + 1), (t / k, t % k), VOCAB.len() * k + t)
        })
    });
    emissions.chain(transitions).collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Linear-chain CRF Example ===\n");

    // "the quick fox jumps"
    let words = vec![3, 2, 0, 1];
    let tags = vec![2, 2, 0, 1];
    let sentence: Vec<&str> = words.iter().map(|&w| VOCAB[w]).collect();
    println!("Sentence: {}", sentence.join(" "));
    println!("Gold:     {:?}\n", tags.iter().map(|&t| TAGS[t]).collect::<Vec<_>>());

    let features = sentence_features(&words);
    let num_params = VOCAB.len() * TAGS.len() + TAGS.len() * TAGS.len();
    let params = ModelParams::new(TAGS.len(), VOCAB.len()).with_lambda(0.1);
    let x = Array2::<f64>::zeros((words.len(), 1));

    // Step 1: objective at theta = 0
    println!("Step 1: Objective at zero weights");
    println!("---------------------------------");
    let mut theta = Array1::<f64>::zeros(num_params);
    let (nll, grad) = instance_neg_log_likelihood(&x, &tags, &theta, &features, &params)?;
    println!("NLL:            {:.6}", nll);
    println!("|gradient|:     {:.6}", grad.dot(&grad).sqrt());
    println!();

    // Step 2: a few steps of gradient descent
    println!("Step 2: Gradient descent");
    println!("------------------------");
    for step in 1..=20 {
        let (nll, grad) = instance_neg_log_likelihood(&x, &tags, &theta, &features, &params)?;
        theta = &theta - &(&grad * 0.5);
        if step % 5 == 0 {
            println!("step {:>2}: NLL = {:.6}", step, nll);
        }
    }
    println!();

    // Step 3: marginals and decoding under the trained weights
    println!("Step 3: Inference");
    println!("-----------------");
    let objective = CrfObjective::new(params);
    let tree = objective.infer(words.len(), &theta, &features)?;
    println!("logZ: {:.6}", tree.log_z());
    let marginals = tree.variable_marginals()?;
    for (pos, row) in marginals.rows().into_iter().enumerate() {
        let probs: Vec<String> = row.iter().map(|p| format!("{:.3}", p)).collect();
        println!("  {:<6} P(tag) = [{}]", sentence[pos], probs.join(", "));
    }

    let map = objective.decode(words.len(), &theta, &features)?;
    let decoded: Vec<&str> = map.labels.iter().map(|&t| TAGS[t]).collect();
    println!("Decoded: {:?} (log score {:.4})", decoded, map.log_score);
    println!();

    // Step 4: verify the analytic gradient
    println!("Step 4: Gradient check");
    println!("----------------------");
    let result = check_objective_gradient(
        &objective,
        words.len(),
        &tags,
        &theta,
        &features,
        &GradientCheckConfig::default(),
    )?;
    println!(
        "max |analytic - numeric| = {:.2e} over {} parameters: {}",
        result.max_abs_diff,
        result.num_elements,
        if result.passed { "ok" } else { "MISMATCH" }
    );

    Ok(())
}
