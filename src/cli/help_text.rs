pub(super) const ROOT_LONG_ABOUT: &str = "\
Content fingerprints for incremental builds

Hashsum digests the source files of every project in a workspace and writes
one hex digest per project. A build system compares digests (or the declared
inputs reported by 'hashsum inputs') between runs to decide whether work that
depends on the sources can be skipped.

CORE CONCEPTS:

  Projects:
    The workspace root is always a project. Subprojects are listed under
    'projects' in hashsum.toml. A project at P hashes the files under P/src
    into P/build/<output_file_name>.

  Selection:
    Files are selected by extension (exact, case-sensitive suffix match) and
    digested in a fixed order: depth-first, siblings sorted by name. A missing
    src directory simply contributes nothing.

  Task rules:
    'calculate' uses the configured algorithm. 'calculate<ALGORITHM>', such
    as 'calculateMD5' or 'calculateSHA256', overrides it for one invocation.
    Task rules accept '--sequential' and no other options.

CONFIGURATION (hashsum.toml, optional):

  algorithm = \"SHA-1\"               # MD2, MD5, SHA-1, SHA-224, SHA-256,
                                    # SHA-384, SHA-512, SHA-512/224, SHA-512/256
  file_extensions = [\"kt\", \"java\"]  # without the leading dot
  output_file_name = \"hash_sum.txt\"
  projects = [\"core\", \"app\"]

TYPICAL WORKFLOW:

  $ hashsum calculate
  $ hashsum calculateMD5
  $ hashsum -C /path/to/workspace inputs
  $ hashsum identify build/hash_sum.txt
";

pub(super) const CALCULATE_LONG_ABOUT: &str = "\
Digest every project and write one digest file per project.

Targets are independent: a project whose digest cannot be written is reported
and the remaining projects still run. The exit status is 1 if any project
failed.

Each output file holds only the lower case hex digest, without a trailing
newline. It is replaced atomically, so readers never observe a partial digest.
";

pub(super) const INPUTS_LONG_ABOUT: &str = "\
Print what each project's digest depends on, without writing anything.

For every project this lists the resolved algorithm, the extension filter,
each matched file with its size, and the output path, followed by a
fingerprint of all of them. The fingerprint changes whenever the digest
could change, so a build system can record it after a successful run and
skip the next run while it stays the same.
";
