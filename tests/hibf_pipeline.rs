use std::io::Write;

use hibf::{BuildConfig, HibfIndex, HierarchicalBinning, IbfBuilder, LayoutReader, PackConfig};

fn write_fasta(dir: &std::path::Path, name: &str, sequence: &str) -> String {
    let path = dir.join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, ">r").unwrap();
    writeln!(file, "{sequence}").unwrap();
    name.to_string()
}

#[test]
fn end_to_end_layout_build_and_persist() {
    let dir = tempfile::tempdir().unwrap();

    let sequences = [
        "ACGTACGTACGTACGTACGTACGTACGTACGT",
        "TTTTGGGGCCCCAAAATTTTGGGGCCCCAAAA",
        "GATTACAGATTACAGATTACAGATTACAGATT",
        "CCCCGGGGAAAATTTTCCCCGGGGAAAATTTT",
    ];
    let mut names = Vec::new();
    let mut counts = Vec::new();
    for (i, seq) in sequences.iter().enumerate() {
        names.push(write_fasta(dir.path(), &format!("seq{i}.fa"), seq));
        counts.push(seq.len() as u64);
    }

    let config = PackConfig {
        bins: 4,
        k: 6,
        ..PackConfig::default()
    };
    let binning = HierarchicalBinning::new(names, counts, config.clone()).unwrap();
    let layout = binning.execute().unwrap();
    let text = layout.to_text();

    let tree = LayoutReader::parse(&text).unwrap();
    assert_eq!(tree.node(tree.root).number_of_technical_bins, 4);

    let build_config = BuildConfig::from_pack_config(&config);
    let builder = IbfBuilder::new(&tree, build_config, dir.path()).unwrap();
    let hierarchy = builder.build().unwrap();
    assert!(hierarchy.get(tree.root).is_some());

    let index = HibfIndex {
        tree,
        ibfs: hierarchy.ibfs,
    };
    let index_path = dir.path().join("index.hibf");
    index.save(&index_path).unwrap();

    let loaded = HibfIndex::load(&index_path).unwrap();
    assert_eq!(loaded.tree.nodes.len(), index.tree.nodes.len());
    assert!(loaded.ibfs[0].is_some());
}
